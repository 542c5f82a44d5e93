// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Source-item snapshot and publish-time translation.
//!
//! The snapshot is taken once, before the per-site fan-out, so every
//! destination sees the same view of the origin item even if the origin
//! changes mid-pass. Taxonomy terms are captured as full term objects
//! keyed by taxonomy name; names (never ids) are the cross-site join
//! key, because term ids are not stable across sites.

use crate::config::SyndicationConfig;
use crate::error::{Result, SyndicationError};
use crate::store::{ContentItem, ContentStore, ItemStatus, SiteId, Term, UserId};
use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

/// Taxonomy whose term names are also passed inline on the item draft.
pub const TAG_TAXONOMY: &str = "tag";

/// The shareable attributes of a source item, captured once per sync.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub source_site: SiteId,
    pub source_item: crate::store::ItemId,
    pub author: UserId,
    pub title: String,
    pub body: String,
    pub excerpt: String,
    pub status: ItemStatus,
    pub content_type: String,
    pub slug: String,
    /// Publish timestamp in the origin site's local wall clock.
    pub published_at: NaiveDateTime,
    pub comments_open: bool,
    pub pings_open: bool,
    pub format: Option<String>,
    /// Tag names, flattened: what gets matched/created on destinations.
    pub tag_names: Vec<String>,
    /// Full term objects per taxonomy, for the destination upsert.
    pub terms_by_taxonomy: BTreeMap<String, Vec<Term>>,
    /// Featured image as a URL snapshot, not a file handle.
    pub thumbnail_url: Option<String>,
    /// Arbitrary custom-field map (empty when copying is disabled).
    pub custom_fields: BTreeMap<String, serde_json::Value>,
    /// The origin site's configured UTC offset, in minutes.
    pub origin_offset_minutes: i32,
}

/// Capture the snapshot of a source item.
pub async fn capture<S: ContentStore>(
    store: &S,
    config: &SyndicationConfig,
    item: &ContentItem,
) -> Result<ItemSnapshot> {
    let site = item.site;
    let info = store
        .site_info(site)
        .await
        .map_err(|e| SyndicationError::remote(site, "site_info", e))?
        .ok_or(SyndicationError::SiteUnavailable(site))?;

    let mut terms_by_taxonomy = BTreeMap::new();
    let taxonomies = store
        .item_taxonomies(site, item.id)
        .await
        .map_err(|e| SyndicationError::remote(site, "item_taxonomies", e))?;
    for taxonomy in taxonomies {
        let terms = store
            .item_terms(site, item.id, taxonomy.clone())
            .await
            .map_err(|e| SyndicationError::remote(site, "item_terms", e))?;
        if !terms.is_empty() {
            terms_by_taxonomy.insert(taxonomy, terms);
        }
    }

    let tag_names = terms_by_taxonomy
        .get(TAG_TAXONOMY)
        .map(|terms| terms.iter().map(|t| t.name.clone()).collect())
        .unwrap_or_default();

    let thumbnail_url = store
        .thumbnail_url(site, item.id)
        .await
        .map_err(|e| SyndicationError::remote(site, "thumbnail_url", e))?;

    let custom_fields = if config.settings.copy_custom_fields {
        store
            .custom_fields(site, item.id)
            .await
            .map_err(|e| SyndicationError::remote(site, "custom_fields", e))?
    } else {
        BTreeMap::new()
    };

    Ok(ItemSnapshot {
        source_site: site,
        source_item: item.id,
        author: item.author,
        title: item.title.clone(),
        body: item.body.clone(),
        excerpt: item.excerpt.clone(),
        status: item.status,
        content_type: item.content_type.clone(),
        slug: item.slug.clone(),
        published_at: item.published_at,
        comments_open: item.comments_open,
        pings_open: item.pings_open,
        format: item.format.clone(),
        tag_names,
        terms_by_taxonomy,
        thumbnail_url,
        custom_fields,
        origin_offset_minutes: info.utc_offset_minutes,
    })
}

/// Translate the origin's local publish time into the destination's
/// local wall clock.
///
/// `dest_local = source_local - (origin_offset - dest_offset)`: both
/// clocks then show the same instant. Offsets are minutes so half-hour
/// zones translate exactly.
pub fn destination_publish_time(
    source_local: NaiveDateTime,
    origin_offset_minutes: i32,
    dest_offset_minutes: i32,
) -> NaiveDateTime {
    let diff = i64::from(origin_offset_minutes) - i64::from(dest_offset_minutes);
    source_local - Duration::minutes(diff)
}
