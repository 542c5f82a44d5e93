// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Origin back-references for destination copies.
//!
//! Every destination item carries a single metadata record naming its
//! origin `(site, item)` pair. The back-reference is how the comment
//! mirror and the edit lock find the source of truth; it never implies
//! ownership of the origin item. At most one origin link may exist per
//! destination item.

use crate::error::{Result, SyndicationError};
use crate::store::{ContentStore, ItemId, SiteId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata key holding the origin back-reference.
pub const ORIGIN_META_KEY: &str = "synd_origin_ref";

/// The `(site, item)` pair a destination copy was syndicated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRef {
    pub site: SiteId,
    pub item: ItemId,
}

/// Read the origin back-reference of an item, if it is a destination copy.
pub async fn read_origin<S: ContentStore>(
    store: &S,
    site: SiteId,
    item: ItemId,
) -> Result<Option<OriginRef>> {
    let raw = store
        .get_meta(site, item, ORIGIN_META_KEY.to_string())
        .await
        .map_err(|e| SyndicationError::remote(site, "get_meta", e))?;

    match raw {
        None => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SyndicationError::State(format!("{}: {}", ORIGIN_META_KEY, e))),
    }
}

/// Write (or overwrite) the origin back-reference on a destination item.
pub async fn write_origin<S: ContentStore>(
    store: &S,
    site: SiteId,
    item: ItemId,
    origin: OriginRef,
) -> Result<()> {
    let value = serde_json::to_value(origin)
        .map_err(|e| SyndicationError::State(format!("{}: {}", ORIGIN_META_KEY, e)))?;
    store
        .set_meta(site, item, ORIGIN_META_KEY.to_string(), value)
        .await
        .map_err(|e| SyndicationError::remote(site, "set_meta", e))
}

/// The back-reference index: destination item -> origin item.
pub struct MasterLinkIndex<S> {
    store: Arc<S>,
}

impl<S> Clone for MasterLinkIndex<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ContentStore> MasterLinkIndex<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Find the origin of a destination item.
    ///
    /// A single metadata read; returns `None` for non-mirrored items.
    pub async fn get_origin(&self, site: SiteId, item: ItemId) -> Result<Option<OriginRef>> {
        read_origin(self.store.as_ref(), site, item).await
    }

    /// Refuse direct edits of destination copies.
    ///
    /// Returns [`SyndicationError::OriginLocked`] naming the origin so
    /// the caller can point the author at the right edit surface.
    pub async fn ensure_editable(&self, site: SiteId, item: ItemId) -> Result<()> {
        match self.get_origin(site, item).await? {
            None => Ok(()),
            Some(origin) => Err(SyndicationError::OriginLocked {
                site,
                item,
                origin_site: origin.site,
                origin_item: origin.item,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::{ItemDraft, ItemStatus};
    use chrono::NaiveDate;

    fn draft(title: &str) -> ItemDraft {
        ItemDraft {
            id: 0,
            author: 10,
            title: title.into(),
            body: String::new(),
            excerpt: String::new(),
            status: ItemStatus::Published,
            content_type: "post".into(),
            slug: title.to_lowercase(),
            published_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            comments_open: true,
            pings_open: true,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn origin_round_trip() {
        let store = Arc::new(MemoryStore::new());
        store.add_site(2, "Dest", 0).await;
        let copy = store.upsert_item(2, draft("Copy")).await.unwrap();

        let index = MasterLinkIndex::new(Arc::clone(&store));
        assert_eq!(index.get_origin(2, copy).await.unwrap(), None);

        write_origin(store.as_ref(), 2, copy, OriginRef { site: 1, item: 77 })
            .await
            .unwrap();
        assert_eq!(
            index.get_origin(2, copy).await.unwrap(),
            Some(OriginRef { site: 1, item: 77 })
        );
    }

    #[tokio::test]
    async fn destination_copy_is_edit_locked() {
        let store = Arc::new(MemoryStore::new());
        store.add_site(2, "Dest", 0).await;
        let copy = store.upsert_item(2, draft("Copy")).await.unwrap();
        write_origin(store.as_ref(), 2, copy, OriginRef { site: 3, item: 5 })
            .await
            .unwrap();

        let index = MasterLinkIndex::new(store);
        let err = index.ensure_editable(2, copy).await.unwrap_err();
        match err {
            SyndicationError::OriginLocked {
                origin_site,
                origin_item,
                ..
            } => {
                assert_eq!(origin_site, 3);
                assert_eq!(origin_item, 5);
            }
            other => panic!("expected OriginLocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_items_are_editable() {
        let store = Arc::new(MemoryStore::new());
        store.add_site(1, "Origin", 0).await;
        let item = store.upsert_item(1, draft("Plain")).await.unwrap();

        let index = MasterLinkIndex::new(store);
        assert!(index.ensure_editable(1, item).await.is_ok());
    }
}
