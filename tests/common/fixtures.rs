// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Seeded networks and builders shared by the integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use syndication_engine::{
    Capability, ItemDraft, ItemStatus, MemoryStore, SyndicationConfig, SyndicationEngine,
};

/// The author every seeded network grants publishing rights to.
pub const AUTHOR: u64 = 7;

/// A user who can publish on site 2 but not edit published items there.
pub const LIMITED_USER: u64 = 9;

pub fn publishing() -> [Capability; 3] {
    [
        Capability::Publish,
        Capability::EditPublished,
        Capability::Edit,
    ]
}

/// 10:00 local on the origin site, the reference publish time.
pub fn ten_am() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 10)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid fixture timestamp")
}

/// A published post draft for create calls (`id` 0).
pub fn post_draft(title: &str) -> ItemDraft {
    ItemDraft {
        id: 0,
        author: AUTHOR,
        title: title.to_string(),
        body: format!("Body of {title}"),
        excerpt: format!("Excerpt of {title}"),
        status: ItemStatus::Published,
        content_type: "post".to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        published_at: ten_am(),
        comments_open: true,
        pings_open: true,
        tags: Vec::new(),
    }
}

/// A three-site network:
///
/// - site 1 "Origin" at UTC+2
/// - site 2 "Regional" at UTC-3
/// - site 3 "Archive" at UTC+0
///
/// [`AUTHOR`] holds full publishing rights on all three sites.
/// [`LIMITED_USER`] can publish on site 2 only, without the right to
/// edit published items.
pub async fn seeded_network() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_site(1, "Origin", 120).await;
    store.add_site(2, "Regional", -180).await;
    store.add_site(3, "Archive", 0).await;
    for site in [1, 2, 3] {
        store.add_member(AUTHOR, site, &publishing()).await;
    }
    store
        .add_member(LIMITED_USER, 2, &[Capability::Publish, Capability::Edit])
        .await;
    store
}

/// An engine over the given store with the default test configuration.
pub fn engine(store: Arc<MemoryStore>) -> SyndicationEngine<MemoryStore> {
    SyndicationEngine::new(store, SyndicationConfig::for_testing())
        .expect("test configuration is valid")
}
