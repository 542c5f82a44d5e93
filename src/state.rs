// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync-state persistence.
//!
//! Tracks, per origin item, which destination copies exist (the targets
//! map) and which sites are currently selected. Both records live as
//! JSON metadata on the origin item itself, so they travel with the item
//! through exports and survive engine restarts without any storage of
//! our own.
//!
//! This layer is pure key-value persistence. Validation (which sites may
//! appear, when entries are dropped) is the engine's responsibility.
//!
//! # Record Semantics
//!
//! The targets map stores the **last successfully recorded** destination
//! id per site. A site missing from the map means "no prior copy": the
//! next reconciliation creates one.

use crate::error::{Result, SyndicationError};
use crate::store::{ContentStore, ItemId, SiteId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Metadata key holding the `site id -> destination item id` map.
pub const TARGETS_META_KEY: &str = "synd_targets";

/// Metadata key holding the currently selected target-site set.
pub const SELECTED_META_KEY: &str = "synd_sync_with";

/// Reads and writes the per-item sync records.
pub struct SyncStateStore<S> {
    store: Arc<S>,
}

impl<S> Clone for SyncStateStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ContentStore> SyncStateStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The destination copies recorded for an origin item.
    ///
    /// Returns an empty map if the item has never been syndicated.
    pub async fn targets(&self, site: SiteId, item: ItemId) -> Result<BTreeMap<SiteId, ItemId>> {
        let raw = self
            .store
            .get_meta(site, item, TARGETS_META_KEY.to_string())
            .await
            .map_err(|e| SyndicationError::remote(site, "get_meta", e))?;

        match raw {
            None => Ok(BTreeMap::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                SyndicationError::State(format!("{}: {}", TARGETS_META_KEY, e))
            }),
        }
    }

    /// Persist the targets map on the origin item.
    pub async fn set_targets(
        &self,
        site: SiteId,
        item: ItemId,
        targets: &BTreeMap<SiteId, ItemId>,
    ) -> Result<()> {
        let value = serde_json::to_value(targets)
            .map_err(|e| SyndicationError::State(format!("{}: {}", TARGETS_META_KEY, e)))?;
        self.store
            .set_meta(site, item, TARGETS_META_KEY.to_string(), value)
            .await
            .map_err(|e| SyndicationError::remote(site, "set_meta", e))?;
        debug!(site, item, count = targets.len(), "Recorded sync targets");
        Ok(())
    }

    /// The site set selected at the last save.
    ///
    /// Returns an empty set if the item has never been syndicated.
    pub async fn selected_sites(&self, site: SiteId, item: ItemId) -> Result<BTreeSet<SiteId>> {
        let raw = self
            .store
            .get_meta(site, item, SELECTED_META_KEY.to_string())
            .await
            .map_err(|e| SyndicationError::remote(site, "get_meta", e))?;

        match raw {
            None => Ok(BTreeSet::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                SyndicationError::State(format!("{}: {}", SELECTED_META_KEY, e))
            }),
        }
    }

    /// Persist the selected-site set on the origin item.
    pub async fn set_selected_sites(
        &self,
        site: SiteId,
        item: ItemId,
        selected: &BTreeSet<SiteId>,
    ) -> Result<()> {
        let value = serde_json::to_value(selected)
            .map_err(|e| SyndicationError::State(format!("{}: {}", SELECTED_META_KEY, e)))?;
        self.store
            .set_meta(site, item, SELECTED_META_KEY.to_string(), value)
            .await
            .map_err(|e| SyndicationError::remote(site, "set_meta", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::{ItemDraft, ItemStatus};
    use chrono::NaiveDate;

    async fn seeded() -> (Arc<MemoryStore>, ItemId) {
        let store = Arc::new(MemoryStore::new());
        store.add_site(1, "Origin", 0).await;
        let item = store
            .upsert_item(
                1,
                ItemDraft {
                    id: 0,
                    author: 10,
                    title: "hello".into(),
                    body: "body".into(),
                    excerpt: String::new(),
                    status: ItemStatus::Published,
                    content_type: "post".into(),
                    slug: "hello".into(),
                    published_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                        .unwrap()
                        .and_hms_opt(10, 0, 0)
                        .unwrap(),
                    comments_open: true,
                    pings_open: true,
                    tags: vec![],
                },
            )
            .await
            .unwrap();
        (store, item)
    }

    #[tokio::test]
    async fn targets_default_empty() {
        let (store, item) = seeded().await;
        let state = SyncStateStore::new(store);
        assert!(state.targets(1, item).await.unwrap().is_empty());
        assert!(state.selected_sites(1, item).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn targets_round_trip() {
        let (store, item) = seeded().await;
        let state = SyncStateStore::new(store);

        let mut targets = BTreeMap::new();
        targets.insert(2, 201);
        targets.insert(3, 77);
        state.set_targets(1, item, &targets).await.unwrap();

        assert_eq!(state.targets(1, item).await.unwrap(), targets);
    }

    #[tokio::test]
    async fn selected_sites_round_trip() {
        let (store, item) = seeded().await;
        let state = SyncStateStore::new(store);

        let selected: BTreeSet<SiteId> = [2, 3].into_iter().collect();
        state.set_selected_sites(1, item, &selected).await.unwrap();

        assert_eq!(state.selected_sites(1, item).await.unwrap(), selected);
    }

    #[tokio::test]
    async fn empty_records_overwrite_previous_state() {
        let (store, item) = seeded().await;
        let state = SyncStateStore::new(store);

        let mut targets = BTreeMap::new();
        targets.insert(2, 201);
        state.set_targets(1, item, &targets).await.unwrap();

        state.set_targets(1, item, &BTreeMap::new()).await.unwrap();
        assert!(state.targets(1, item).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_targets_meta_is_a_state_error() {
        let (store, item) = seeded().await;
        store
            .set_meta(
                1,
                item,
                TARGETS_META_KEY.to_string(),
                serde_json::json!("not a map"),
            )
            .await
            .unwrap();

        let state = SyncStateStore::new(store);
        let err = state.targets(1, item).await.unwrap_err();
        assert!(matches!(err, SyndicationError::State(_)));
    }
}
