// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The syndication engine.
//!
//! The main orchestrator that ties together:
//! - Target resolution via [`crate::resolver::SiteTargetResolver`]
//! - Sync-state persistence via [`crate::state::SyncStateStore`]
//! - Origin back-references via [`crate::link::MasterLinkIndex`]
//! - Write suppression via [`crate::guard::ReentrancyGate`]
//!
//! # Reconciliation Order
//!
//! The order is load-bearing:
//! 1. Resolve the effective target set from the submitted list.
//! 2. Load the previously recorded targets map.
//! 3. Delete destination copies on deselected sites, dropping their
//!    map entries.
//! 4. If the effective set is empty, persist the empty records and stop.
//! 5. Snapshot the source item's shareable attributes once.
//! 6. Apply the snapshot to each effective site, strictly sequentially,
//!    in the submitted order.
//! 7. Persist the updated targets map and the effective set.

pub mod snapshot;
mod site_pass;
pub mod types;

pub use types::{CascadeReport, SaveEvent, SiteFailure, SyncReport};

use crate::config::SyndicationConfig;
use crate::error::{Result, SyndicationError};
use crate::guard::ReentrancyGate;
use crate::link::MasterLinkIndex;
use crate::metrics;
use crate::resolver::SiteTargetResolver;
use crate::state::SyncStateStore;
use crate::store::{Capability, ContentItem, ContentStore, SiteId};
use site_pass::SitePass;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The cross-site post-mirroring engine.
///
/// One instance serves the whole network; every operation is addressed
/// to explicit site ids, so no instance-level site state exists. The
/// per-site fan-out is strictly sequential by construction.
pub struct SyndicationEngine<S: ContentStore> {
    store: Arc<S>,
    config: SyndicationConfig,
    resolver: SiteTargetResolver<S>,
    state: SyncStateStore<S>,
    links: MasterLinkIndex<S>,
    gate: Arc<ReentrancyGate>,
}

impl<S: ContentStore> SyndicationEngine<S> {
    /// Create an engine over a content store.
    ///
    /// Fails with [`SyndicationError::Config`] when the configuration is
    /// unusable (e.g. no eligible content types), so misconfiguration
    /// surfaces at startup rather than mid-save.
    pub fn new(store: Arc<S>, config: SyndicationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver: SiteTargetResolver::new(Arc::clone(&store)),
            state: SyncStateStore::new(Arc::clone(&store)),
            links: MasterLinkIndex::new(Arc::clone(&store)),
            gate: Arc::new(ReentrancyGate::new()),
            store,
            config,
        })
    }

    /// The shared suppression gate, for wiring hosts and the
    /// [`LifecycleMirror`](crate::lifecycle::LifecycleMirror).
    pub fn gate(&self) -> Arc<ReentrancyGate> {
        Arc::clone(&self.gate)
    }

    /// The target-site resolver.
    pub fn resolver(&self) -> &SiteTargetResolver<S> {
        &self.resolver
    }

    /// The sync-state store.
    pub fn state(&self) -> &SyncStateStore<S> {
        &self.state
    }

    /// The origin back-reference index.
    pub fn links(&self) -> &MasterLinkIndex<S> {
        &self.links
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyndicationConfig {
        &self.config
    }

    /// Save entry point.
    ///
    /// Invoked by the host on every item save together with the
    /// author's submitted target-site list. Autosaves, revisions,
    /// ineligible content types, destination copies, and saves by users
    /// who may not edit the item all pass through untouched.
    ///
    /// Site-scoped failures are absorbed into the returned report; the
    /// caller's save never fails because one destination site is broken.
    pub async fn handle_save(&self, event: SaveEvent, requested: &[SiteId]) -> Result<SyncReport> {
        if self.gate.is_active() {
            // Suppression is matched precisely around each destination
            // write; reaching this point means the bookkeeping broke.
            error!(
                site = event.site,
                item = event.item,
                "Save handler re-entered while suppression was active"
            );
            return Err(SyndicationError::Reentrancy);
        }

        if event.is_autosave || event.is_revision {
            return Ok(SyncReport::default());
        }

        let item = self
            .store
            .get_item(event.site, event.item)
            .await
            .map_err(|e| SyndicationError::remote(event.site, "get_item", e))?
            .ok_or(SyndicationError::ItemNotFound {
                site: event.site,
                item: event.item,
            })?;

        if !self.config.is_eligible(&item.content_type) {
            debug!(
                site = event.site,
                item = event.item,
                content_type = %item.content_type,
                "Content type not enabled for syndication"
            );
            return Ok(SyncReport::default());
        }

        // A destination copy is a read-only mirror; it never fans out.
        if self.links.get_origin(event.site, event.item).await?.is_some() {
            debug!(site = event.site, item = event.item, "Item is a syndicated copy, ignoring save");
            return Ok(SyncReport::default());
        }

        let may_edit = self
            .store
            .user_can(event.user, event.site, Capability::Edit)
            .await
            .map_err(|e| SyndicationError::remote(event.site, "user_can", e))?;
        if !may_edit {
            debug!(site = event.site, item = event.item, user = event.user, "User may not edit the item, ignoring save");
            return Ok(SyncReport::default());
        }

        self.sync(&item, requested).await
    }

    /// Reconcile destination copies with the requested target-site set.
    ///
    /// After this returns, the recorded targets map covers exactly the
    /// resolver-approved sites (plus failed sites whose copies already
    /// exist), and the requested set is persisted as the selection.
    pub async fn sync(&self, item: &ContentItem, requested: &[SiteId]) -> Result<SyncReport> {
        let started = Instant::now();
        let mut report = SyncReport::default();

        let effective = self
            .resolver
            .resolve(item.author, item.site, requested)
            .await;
        let mut targets = self.state.targets(item.site, item.id).await?;

        info!(
            site = item.site,
            item = item.id,
            requested = requested.len(),
            effective = effective.len(),
            prior = targets.len(),
            "Reconciling syndication targets"
        );

        // Removal pass first: deselected sites lose their copies before
        // any new work happens.
        let to_remove: Vec<SiteId> = targets
            .keys()
            .copied()
            .filter(|site| !effective.contains(site))
            .collect();
        for site in to_remove {
            if let Some(destination) = targets.remove(&site) {
                match self.delete_destination(site, destination).await {
                    Ok(()) => {
                        metrics::record_destination_removed(site);
                        report.removed.push(site);
                    }
                    Err(e) if e.is_site_scoped() => {
                        warn!(site, destination, error = %e, "Failed to delete deselected copy");
                        report.failures.push(SiteFailure {
                            site,
                            operation: "delete_item".to_string(),
                            message: e.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        // Nothing selected: persist the teardown and stop. No creation
        // pass runs.
        if effective.is_empty() {
            self.state.set_targets(item.site, item.id, &targets).await?;
            self.state
                .set_selected_sites(item.site, item.id, &BTreeSet::new())
                .await?;
            report.targets = targets;
            metrics::record_sync_pass(started.elapsed(), report.is_clean());
            return Ok(report);
        }

        // One snapshot feeds every destination.
        let snap = snapshot::capture(self.store.as_ref(), &self.config, item).await?;

        for &site in &effective {
            let prior = targets.get(&site).copied();
            let pass = site_pass::apply_to_site(
                self.store.as_ref(),
                &self.resolver,
                &self.gate,
                &self.config,
                &snap,
                site,
                prior,
            )
            .await?;

            match pass {
                SitePass::Synced {
                    destination,
                    created,
                } => {
                    targets.insert(site, destination);
                    if created {
                        report.created.push(site);
                    } else {
                        report.updated.push(site);
                    }
                    metrics::record_site_pass(site, "synced");
                }
                SitePass::Skipped => {
                    report.skipped.push(site);
                    metrics::record_site_pass(site, "skipped");
                }
                SitePass::Failed {
                    destination,
                    failure,
                } => {
                    // A copy that was written before the failure keeps
                    // its entry so the next save updates it in place.
                    if let Some(id) = destination {
                        targets.insert(site, id);
                    }
                    report.failures.push(failure);
                    metrics::record_site_pass(site, "failed");
                }
            }
        }

        self.state.set_targets(item.site, item.id, &targets).await?;
        let selected: BTreeSet<SiteId> = effective.iter().copied().collect();
        self.state
            .set_selected_sites(item.site, item.id, &selected)
            .await?;

        info!(
            site = item.site,
            item = item.id,
            created = report.created.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "Reconciliation complete"
        );

        report.targets = targets;
        metrics::record_sync_pass(started.elapsed(), report.is_clean());
        Ok(report)
    }

    /// Permanently delete one destination copy, suppressed.
    async fn delete_destination(&self, site: SiteId, destination: crate::store::ItemId) -> Result<()> {
        let _suppress = self.gate.enter()?;
        self.store
            .delete_item(site, destination, true)
            .await
            .map_err(|e| SyndicationError::remote(site, "delete_item", e))?;
        Ok(())
    }
}
