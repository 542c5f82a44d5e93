// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Content store integration trait.
//!
//! Defines the interface the syndication engine needs from the host
//! content network: item CRUD, taxonomy terms, metadata, thumbnails,
//! comments, and per-site membership/capability queries. Every method
//! takes the target site id explicitly; the engine never relies on an
//! ambient "current site" pointer, so no switch/restore pairing can be
//! forgotten on an error path.
//!
//! This trait allows testing with the in-memory [`MemoryStore`] and
//! decouples the engine from any particular backend.
//!
//! [`MemoryStore`]: crate::memory::MemoryStore

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Site identifier within the network.
pub type SiteId = u64;
/// Content item identifier, unique within one site.
pub type ItemId = u64;
/// User identifier, shared across the network.
pub type UserId = u64;
/// Taxonomy term identifier, unique within one site.
pub type TermId = u64;
/// Media attachment identifier, unique within one site.
pub type AttachmentId = u64;
/// Comment identifier, unique within one site.
pub type CommentId = u64;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Simplified error for store operations.
///
/// The engine does not branch on backend-specific failure causes; it only
/// needs a message to log and to attach to the per-site failure record.
#[derive(Debug, Clone)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// Capabilities the engine checks before writing to a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// May publish new items on the site.
    Publish,
    /// May edit items that are already published on the site.
    EditPublished,
    /// May edit a given existing item (source-side save check).
    Edit,
}

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Draft,
    Pending,
    Published,
    Trashed,
}

/// A site in the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub id: SiteId,
    /// Human-readable site name, shown in the target checkbox list.
    pub name: String,
    /// Configured wall-clock offset from UTC, in minutes.
    ///
    /// Minutes rather than whole hours so half-hour zones survive the
    /// publish-time translation.
    pub utc_offset_minutes: i32,
}

/// A taxonomy classification value (category, tag, ...).
///
/// Term ids are not stable across independent sites, so the name (with
/// its slug and description) is the cross-site join key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

/// An origin or destination unit of content, as read from a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub site: SiteId,
    pub id: ItemId,
    pub author: UserId,
    pub title: String,
    pub body: String,
    pub excerpt: String,
    pub status: ItemStatus,
    pub content_type: String,
    pub slug: String,
    /// Publish timestamp in the owning site's local wall clock.
    pub published_at: NaiveDateTime,
    pub comments_open: bool,
    pub pings_open: bool,
    pub format: Option<String>,
    pub thumbnail: Option<AttachmentId>,
}

/// The payload for a create-or-update write.
///
/// `id == 0` is the creation sentinel: the store allocates a fresh item
/// id and returns it. Any other id updates that existing item in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub id: ItemId,
    pub author: UserId,
    pub title: String,
    pub body: String,
    pub excerpt: String,
    pub status: ItemStatus,
    pub content_type: String,
    pub slug: String,
    pub published_at: NaiveDateTime,
    pub comments_open: bool,
    pub pings_open: bool,
    /// Tag names assigned at write time, matched or created by name.
    pub tags: Vec<String>,
}

/// A comment submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    /// The item the comment targets on the site it is inserted into.
    pub item: ItemId,
    pub author_name: String,
    pub body: String,
    /// Immediate parent comment, `None` for a top-level comment.
    pub parent: Option<CommentId>,
}

/// A stored comment, as read back from a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: CommentId,
    pub item: ItemId,
    pub author_name: String,
    pub body: String,
    pub parent: Option<CommentId>,
}

/// Trait defining what the engine needs from the content network.
///
/// All writes are addressed to an explicit site id. Implementations that
/// wrap a backend with a process-wide "active site" pointer must scope
/// the switch inside each method, restoring the prior site on every exit
/// path, so callers never observe a leaked switch.
pub trait ContentStore: Send + Sync + 'static {
    // -- sites and permissions -----------------------------------------

    /// List every site in the network.
    fn sites(&self) -> BoxFuture<'_, Vec<SiteInfo>>;

    /// Look up one site. Returns `None` if the site does not exist.
    fn site_info(&self, site: SiteId) -> BoxFuture<'_, Option<SiteInfo>>;

    /// Check whether a user is a member of a site.
    fn is_member(&self, user: UserId, site: SiteId) -> BoxFuture<'_, bool>;

    /// Check whether a user holds a capability on a site.
    fn user_can(&self, user: UserId, site: SiteId, capability: Capability) -> BoxFuture<'_, bool>;

    // -- items ----------------------------------------------------------

    /// Fetch an item. Returns `None` if it does not exist.
    fn get_item(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, Option<ContentItem>>;

    /// Create or update an item; see [`ItemDraft`] for the id sentinel.
    ///
    /// Returns the id of the written item.
    fn upsert_item(&self, site: SiteId, draft: ItemDraft) -> BoxFuture<'_, ItemId>;

    /// Delete an item. `force` bypasses the trash and removes it
    /// permanently. Returns `false` if the item did not exist.
    fn delete_item(&self, site: SiteId, item: ItemId, force: bool) -> BoxFuture<'_, bool>;

    /// Move an item to the reversible trashed state.
    /// Returns `false` if the item did not exist.
    fn trash_item(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, bool>;

    // -- taxonomy -------------------------------------------------------

    /// Taxonomies that have terms assignable to an item.
    fn item_taxonomies(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, Vec<String>>;

    /// Terms of one taxonomy currently assigned to an item.
    fn item_terms(&self, site: SiteId, item: ItemId, taxonomy: String)
        -> BoxFuture<'_, Vec<Term>>;

    /// Create the term if absent (matched by name within its taxonomy),
    /// otherwise reuse the existing one. Returns the term id either way.
    fn upsert_term(&self, site: SiteId, term: Term) -> BoxFuture<'_, TermId>;

    /// Replace an item's term assignment for one taxonomy wholesale.
    ///
    /// Clear-then-set, not merge: names absent from `names` are removed
    /// so stale terms don't linger on the destination.
    fn set_item_terms(
        &self,
        site: SiteId,
        item: ItemId,
        taxonomy: String,
        names: Vec<String>,
    ) -> BoxFuture<'_, ()>;

    // -- metadata -------------------------------------------------------

    /// Read one metadata value.
    fn get_meta(&self, site: SiteId, item: ItemId, key: String)
        -> BoxFuture<'_, Option<serde_json::Value>>;

    /// Write one metadata value, replacing any previous value.
    fn set_meta(
        &self,
        site: SiteId,
        item: ItemId,
        key: String,
        value: serde_json::Value,
    ) -> BoxFuture<'_, ()>;

    /// The item's arbitrary custom-field map (distinct from the engine's
    /// own bookkeeping metadata).
    fn custom_fields(
        &self,
        site: SiteId,
        item: ItemId,
    ) -> BoxFuture<'_, BTreeMap<String, serde_json::Value>>;

    /// Write one custom field on an item.
    fn set_custom_field(
        &self,
        site: SiteId,
        item: ItemId,
        key: String,
        value: serde_json::Value,
    ) -> BoxFuture<'_, ()>;

    // -- featured image -------------------------------------------------

    /// Source URL of the item's featured image, if it has one.
    fn thumbnail_url(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, Option<String>>;

    /// Fetch an image by URL and store it as a new media object on the
    /// site, attached to the given item. Returns the new attachment id.
    fn sideload_image(
        &self,
        site: SiteId,
        url: String,
        attach_to: ItemId,
    ) -> BoxFuture<'_, AttachmentId>;

    /// Set an item's featured image, replacing any existing one.
    fn set_thumbnail(
        &self,
        site: SiteId,
        item: ItemId,
        attachment: AttachmentId,
    ) -> BoxFuture<'_, ()>;

    /// Remove an item's featured image, if any.
    fn clear_thumbnail(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, ()>;

    // -- format ---------------------------------------------------------

    /// Set or clear the item's format flag.
    fn set_format(&self, site: SiteId, item: ItemId, format: Option<String>)
        -> BoxFuture<'_, ()>;

    // -- comments -------------------------------------------------------

    /// Insert a comment on a site. Returns the new comment id.
    fn insert_comment(&self, site: SiteId, comment: CommentDraft) -> BoxFuture<'_, CommentId>;

    /// Total comment count stored against an item on a site.
    fn comment_count(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, u64>;
}
