//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Per-site sync outcomes
//! - Reconciliation pass duration
//! - Destination removals
//! - Lifecycle cascades
//! - Comment rerouting
//! - Image sideloads
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `syndication_` and follow Prometheus
//! conventions:
//! - Counters end in `_total`
//! - Histograms track distributions (duration)

use metrics::{counter, histogram};
use std::time::Duration;

/// Record the outcome of one destination-site pass.
pub fn record_site_pass(site: u64, outcome: &str) {
    counter!("syndication_site_passes_total", "site" => site.to_string(), "outcome" => outcome.to_string()).increment(1);
}

/// Record a deselected destination copy being removed.
pub fn record_destination_removed(site: u64) {
    counter!("syndication_destinations_removed_total", "site" => site.to_string()).increment(1);
}

/// Record one full reconciliation pass.
pub fn record_sync_pass(duration: Duration, clean: bool) {
    let status = if clean { "clean" } else { "degraded" };
    counter!("syndication_sync_passes_total", "status" => status).increment(1);
    histogram!("syndication_sync_duration_seconds").record(duration.as_secs_f64());
}

/// Record one destination touched by a lifecycle cascade.
pub fn record_lifecycle_cascade(action: &str, status: &str) {
    counter!("syndication_lifecycle_cascades_total", "action" => action.to_string(), "status" => status.to_string()).increment(1);
}

/// Record a comment rerouted from a copy to its origin.
pub fn record_comment_rerouted(origin_site: u64) {
    counter!("syndication_comments_rerouted_total", "origin_site" => origin_site.to_string()).increment(1);
}

/// Record an image sideload attempt on a destination site.
pub fn record_image_sideload(site: u64, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("syndication_image_sideloads_total", "site" => site.to_string(), "status" => status).increment(1);
}
