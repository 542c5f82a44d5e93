// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Lifecycle cascading for syndicated items.
//!
//! When a source item is deleted or trashed, every known destination
//! copy follows it. The cascade runs off the recorded targets map, so
//! only copies this engine created are touched. Destination writes are
//! suppressed the same way syndication writes are, so a cascading
//! delete never triggers a second cascade.

use crate::engine::{CascadeReport, SiteFailure};
use crate::error::{Result, SyndicationError};
use crate::guard::ReentrancyGate;
use crate::metrics;
use crate::state::SyncStateStore;
use crate::store::{ContentStore, ItemId, SiteId};
use std::sync::Arc;
use tracing::{info, warn};

/// Which lifecycle transition is cascading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CascadeAction {
    /// Permanent removal, bypassing the trash.
    Delete,
    /// Reversible move to the trashed state.
    Trash,
}

impl CascadeAction {
    fn as_str(self) -> &'static str {
        match self {
            CascadeAction::Delete => "delete",
            CascadeAction::Trash => "trash",
        }
    }
}

/// Mirrors source-item lifecycle transitions onto destination copies.
pub struct LifecycleMirror<S: ContentStore> {
    store: Arc<S>,
    state: SyncStateStore<S>,
    gate: Arc<ReentrancyGate>,
}

impl<S: ContentStore> LifecycleMirror<S> {
    /// The gate must be the one the engine writes through, otherwise a
    /// cascade delete on a destination site would be observed as a
    /// fresh deletion there.
    pub fn new(store: Arc<S>, gate: Arc<ReentrancyGate>) -> Self {
        Self {
            state: SyncStateStore::new(Arc::clone(&store)),
            store,
            gate,
        }
    }

    /// Permanently delete every destination copy of a source item.
    ///
    /// Called when the source item is deleted outright. One broken site
    /// never stops the cascade to the others.
    pub async fn on_delete(&self, site: SiteId, item: ItemId) -> Result<CascadeReport> {
        self.cascade(site, item, CascadeAction::Delete).await
    }

    /// Trash every destination copy of a source item.
    pub async fn on_trash(&self, site: SiteId, item: ItemId) -> Result<CascadeReport> {
        self.cascade(site, item, CascadeAction::Trash).await
    }

    async fn cascade(
        &self,
        site: SiteId,
        item: ItemId,
        action: CascadeAction,
    ) -> Result<CascadeReport> {
        if self.gate.is_active() {
            // This is the engine's own destination write coming back
            // around; the cascade must not recurse.
            return Ok(CascadeReport::default());
        }

        let targets = self.state.targets(site, item).await?;
        let mut report = CascadeReport::default();

        for (&dest_site, &dest_item) in &targets {
            report.attempted += 1;
            match self.apply(dest_site, dest_item, action).await {
                Ok(()) => {
                    report.completed += 1;
                    metrics::record_lifecycle_cascade(action.as_str(), "ok");
                }
                Err(e) if e.is_site_scoped() => {
                    warn!(
                        site = dest_site,
                        item = dest_item,
                        action = action.as_str(),
                        error = %e,
                        "Lifecycle cascade failed for destination"
                    );
                    metrics::record_lifecycle_cascade(action.as_str(), "failed");
                    report.failures.push(SiteFailure {
                        site: dest_site,
                        operation: format!("{}_item", action.as_str()),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            site,
            item,
            action = action.as_str(),
            attempted = report.attempted,
            completed = report.completed,
            "Lifecycle cascade finished"
        );
        Ok(report)
    }

    async fn apply(&self, site: SiteId, item: ItemId, action: CascadeAction) -> Result<()> {
        let _suppress = self.gate.enter()?;
        match action {
            CascadeAction::Trash => {
                self.store
                    .trash_item(site, item)
                    .await
                    .map_err(|e| SyndicationError::remote(site, "trash_item", e))?;
            }
            CascadeAction::Delete => {
                self.store
                    .delete_item(site, item, true)
                    .await
                    .map_err(|e| SyndicationError::remote(site, "delete_item", e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::{Capability, ItemDraft, ItemStatus};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn draft(title: &str) -> ItemDraft {
        ItemDraft {
            id: 0,
            author: 1,
            title: title.to_string(),
            body: String::new(),
            excerpt: String::new(),
            status: ItemStatus::Published,
            content_type: "post".to_string(),
            slug: title.to_lowercase(),
            published_at: NaiveDate::from_ymd_opt(2026, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap_or_default(),
            comments_open: true,
            pings_open: true,
            tags: Vec::new(),
        }
    }

    async fn network_with_copies() -> (Arc<MemoryStore>, ItemId, BTreeMap<SiteId, ItemId>) {
        let store = Arc::new(MemoryStore::new());
        store.add_site(1, "Origin", 0).await;
        store.add_site(2, "Mirror A", 0).await;
        store.add_site(3, "Mirror B", 0).await;
        store.add_member(1, 1, &[Capability::Publish, Capability::EditPublished]).await;

        let source = store.upsert_item(1, draft("Source")).await.unwrap();
        let copy_a = store.upsert_item(2, draft("Source")).await.unwrap();
        let copy_b = store.upsert_item(3, draft("Source")).await.unwrap();

        let targets: BTreeMap<SiteId, ItemId> =
            [(2, copy_a), (3, copy_b)].into_iter().collect();
        let state = SyncStateStore::new(Arc::clone(&store));
        state.set_targets(1, source, &targets).await.unwrap();
        (store, source, targets)
    }

    #[tokio::test]
    async fn delete_cascades_to_every_destination() {
        let (store, source, targets) = network_with_copies().await;
        let mirror = LifecycleMirror::new(Arc::clone(&store), Arc::new(ReentrancyGate::new()));

        let report = mirror.on_delete(1, source).await.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.completed, 2);
        assert!(report.failures.is_empty());

        let deletes = store.recorded_deletes().await;
        assert_eq!(deletes.len(), 2);
        assert!(deletes.iter().all(|d| d.force));
        for (&site, &item) in &targets {
            assert!(store.get_item(site, item).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn trash_cascades_without_force_delete() {
        let (store, source, targets) = network_with_copies().await;
        let mirror = LifecycleMirror::new(Arc::clone(&store), Arc::new(ReentrancyGate::new()));

        let report = mirror.on_trash(1, source).await.unwrap();
        assert_eq!(report.completed, 2);
        assert_eq!(store.recorded_trashes().await.len(), 2);
        assert!(store.recorded_deletes().await.is_empty());

        for (&site, &item) in &targets {
            let copy = store.get_item(site, item).await.unwrap().unwrap();
            assert_eq!(copy.status, ItemStatus::Trashed);
        }
    }

    #[tokio::test]
    async fn suppressed_invocation_is_a_no_op() {
        let (store, source, targets) = network_with_copies().await;
        let gate = Arc::new(ReentrancyGate::new());
        let mirror = LifecycleMirror::new(Arc::clone(&store), Arc::clone(&gate));

        let _suppress = gate.enter().unwrap();
        let report = mirror.on_delete(1, source).await.unwrap();
        assert_eq!(report.attempted, 0);
        for (&site, &item) in &targets {
            assert!(store.get_item(site, item).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn unlinked_item_cascades_nowhere() {
        let (store, _, _) = network_with_copies().await;
        let mirror = LifecycleMirror::new(Arc::clone(&store), Arc::new(ReentrancyGate::new()));

        let report = mirror.on_delete(1, 999).await.unwrap();
        assert_eq!(report.attempted, 0);
        assert!(store.recorded_deletes().await.is_empty());
    }

    #[tokio::test]
    async fn one_broken_site_does_not_stop_the_cascade() {
        let store = Arc::new(MemoryStore::new());
        store.add_site(1, "Origin", 0).await;
        store.add_site(2, "Mirror A", 0).await;
        let source = store.upsert_item(1, draft("Source")).await.unwrap();
        let copy_a = store.upsert_item(2, draft("Source")).await.unwrap();

        // Site 9 was recorded but has since vanished from the network.
        let targets: BTreeMap<SiteId, ItemId> =
            [(2, copy_a), (9, 123)].into_iter().collect();
        let state = SyncStateStore::new(Arc::clone(&store));
        state.set_targets(1, source, &targets).await.unwrap();

        let mirror = LifecycleMirror::new(Arc::clone(&store), Arc::new(ReentrancyGate::new()));
        let report = mirror.on_delete(1, source).await.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.completed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].site, 9);
        assert!(store.get_item(2, copy_a).await.unwrap().is_none());
    }
}
