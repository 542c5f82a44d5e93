// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The per-site apply step of a reconciliation.
//!
//! Runs the full destination-site sequence for one site: re-validate
//! permissions, upsert taxonomy terms, write the item (suppressed),
//! mirror the featured image, replace term assignments, copy format and
//! custom fields, and write the origin back-reference.
//!
//! A store failure here is absorbed into a [`SitePass::Failed`] so the
//! engine can continue with sibling sites; only fatal errors (broken
//! suppression) propagate.

use crate::config::SyndicationConfig;
use crate::engine::snapshot::{destination_publish_time, ItemSnapshot};
use crate::engine::types::SiteFailure;
use crate::error::{Result, SyndicationError};
use crate::guard::ReentrancyGate;
use crate::link::{write_origin, OriginRef};
use crate::metrics;
use crate::resolver::SiteTargetResolver;
use crate::store::{ContentStore, ItemDraft, ItemId, SiteId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Outcome of one destination-site pass.
#[derive(Debug)]
pub(crate) enum SitePass {
    /// The destination copy is fully up to date.
    Synced { destination: ItemId, created: bool },
    /// Permission was lost between resolution and the pass; nothing was
    /// written.
    Skipped,
    /// A store operation failed; remaining sub-steps for this site were
    /// aborted. `destination` holds the copy's id when the item write
    /// itself had already succeeded, so the next save updates it in
    /// place instead of creating a duplicate.
    Failed {
        destination: Option<ItemId>,
        failure: SiteFailure,
    },
}

fn to_failure(site: SiteId, error: &SyndicationError) -> SiteFailure {
    match error {
        SyndicationError::RemoteWrite {
            operation, message, ..
        } => SiteFailure {
            site,
            operation: operation.clone(),
            message: message.clone(),
        },
        other => SiteFailure {
            site,
            operation: "site_pass".to_string(),
            message: other.to_string(),
        },
    }
}

/// Apply the snapshot to one destination site.
///
/// `prior` is the destination id recorded by an earlier sync, if any;
/// `0` is defensively treated the same as "no prior copy".
pub(crate) async fn apply_to_site<S: ContentStore>(
    store: &S,
    resolver: &SiteTargetResolver<S>,
    gate: &ReentrancyGate,
    config: &SyndicationConfig,
    snapshot: &ItemSnapshot,
    site: SiteId,
    prior: Option<ItemId>,
) -> Result<SitePass> {
    let prior = prior.filter(|&id| id != 0);
    let mut destination = prior;
    let mut created = false;

    let outcome: Result<bool> = async {
        let info = store
            .site_info(site)
            .await
            .map_err(|e| SyndicationError::remote(site, "site_info", e))?
            .ok_or(SyndicationError::SiteUnavailable(site))?;

        // Re-validate membership and capability: a race between
        // resolution and this pass is possible in a multi-actor system.
        if !resolver.can_for_site(snapshot.author, site).await {
            debug!(site, author = snapshot.author, "Permission lost since resolution, skipping site");
            return Ok(false);
        }

        // Upsert every snapshotted term by name, collecting the
        // resulting name set per taxonomy for the wholesale re-assign.
        let mut names_by_taxonomy: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (taxonomy, terms) in &snapshot.terms_by_taxonomy {
            for term in terms {
                store
                    .upsert_term(site, term.clone())
                    .await
                    .map_err(|e| SyndicationError::remote(site, "upsert_term", e))?;
                names_by_taxonomy
                    .entry(taxonomy.clone())
                    .or_default()
                    .push(term.name.clone());
            }
        }

        let published_at = destination_publish_time(
            snapshot.published_at,
            snapshot.origin_offset_minutes,
            info.utc_offset_minutes,
        );

        let draft = ItemDraft {
            id: destination.unwrap_or(0),
            author: snapshot.author,
            title: snapshot.title.clone(),
            body: snapshot.body.clone(),
            excerpt: snapshot.excerpt.clone(),
            status: snapshot.status,
            content_type: snapshot.content_type.clone(),
            slug: snapshot.slug.clone(),
            published_at,
            comments_open: snapshot.comments_open,
            pings_open: snapshot.pings_open,
            tags: snapshot.tag_names.clone(),
        };

        // The write must not re-enter the save entry point; suppression
        // covers exactly this one call.
        let written = {
            let _suppress = gate.enter()?;
            store
                .upsert_item(site, draft)
                .await
                .map_err(|e| SyndicationError::remote(site, "upsert_item", e))?
        };
        created = destination.is_none();
        destination = Some(written);

        match &snapshot.thumbnail_url {
            Some(url) if config.settings.sideload_images => {
                let attachment = store
                    .sideload_image(site, url.clone(), written)
                    .await
                    .map_err(|e| {
                        metrics::record_image_sideload(site, false);
                        SyndicationError::remote(site, "sideload_image", e)
                    })?;
                metrics::record_image_sideload(site, true);
                store
                    .set_thumbnail(site, written, attachment)
                    .await
                    .map_err(|e| SyndicationError::remote(site, "set_thumbnail", e))?;
            }
            // Sideloading disabled: leave whatever thumbnail the
            // destination already has untouched.
            Some(_) => {}
            None => {
                store
                    .clear_thumbnail(site, written)
                    .await
                    .map_err(|e| SyndicationError::remote(site, "clear_thumbnail", e))?;
            }
        }

        // Clear-then-set so terms removed at the origin don't linger.
        for (taxonomy, names) in names_by_taxonomy {
            store
                .set_item_terms(site, written, taxonomy, names)
                .await
                .map_err(|e| SyndicationError::remote(site, "set_item_terms", e))?;
        }

        store
            .set_format(site, written, snapshot.format.clone())
            .await
            .map_err(|e| SyndicationError::remote(site, "set_format", e))?;

        for (key, value) in &snapshot.custom_fields {
            store
                .set_custom_field(site, written, key.clone(), value.clone())
                .await
                .map_err(|e| SyndicationError::remote(site, "set_custom_field", e))?;
        }

        write_origin(
            store,
            site,
            written,
            OriginRef {
                site: snapshot.source_site,
                item: snapshot.source_item,
            },
        )
        .await?;

        Ok(true)
    }
    .await;

    match outcome {
        Ok(true) => match destination {
            Some(id) => Ok(SitePass::Synced {
                destination: id,
                created,
            }),
            // Unreachable: the pass only reports success after the item
            // write recorded an id.
            None => Err(SyndicationError::State(
                "destination id missing after successful pass".to_string(),
            )),
        },
        Ok(false) => Ok(SitePass::Skipped),
        Err(error) if error.is_site_scoped() => {
            warn!(
                site,
                source_item = snapshot.source_item,
                error = %error,
                "Destination pass failed, sibling sites unaffected"
            );
            Ok(SitePass::Failed {
                destination,
                failure: to_failure(site, &error),
            })
        }
        Err(error) => Err(error),
    }
}
