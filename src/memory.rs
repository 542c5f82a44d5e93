// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory content network.
//!
//! A complete [`ContentStore`] implementation holding a whole multisite
//! network in process memory: sites, memberships, items, terms,
//! attachments, metadata, and comments. It backs the crate's unit and
//! integration tests and doubles as a reference backend for embedders
//! prototyping against the engine.
//!
//! Destructive operations (deletes, trashes, image sideloads) are
//! recorded so tests can assert exactly which calls the engine made.
//! Image sideloads can be made to fail per URL to exercise per-site
//! failure isolation.

use crate::store::{
    AttachmentId, BoxFuture, Capability, CommentDraft, CommentId, CommentRecord, ContentItem,
    ContentStore, ItemDraft, ItemId, ItemStatus, SiteId, SiteInfo, StoreError, Term, TermId,
    UserId,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

/// A recorded permanent-or-trash delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub site: SiteId,
    pub item: ItemId,
    pub force: bool,
}

/// A recorded image sideload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideloadCall {
    pub site: SiteId,
    pub url: String,
    pub attach_to: ItemId,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
struct Attachment {
    source_url: String,
    #[allow(dead_code)] // Recorded for future detailed assertions
    attached_to: ItemId,
}

#[derive(Debug, Clone)]
struct ItemState {
    item: ContentItem,
    meta: BTreeMap<String, serde_json::Value>,
    custom: BTreeMap<String, serde_json::Value>,
    /// Assigned term names per taxonomy.
    terms: BTreeMap<String, Vec<String>>,
}

#[derive(Debug)]
struct SiteState {
    info: SiteInfo,
    next_item: ItemId,
    next_term: TermId,
    next_attachment: AttachmentId,
    next_comment: CommentId,
    items: BTreeMap<ItemId, ItemState>,
    terms: BTreeMap<TermId, Term>,
    attachments: BTreeMap<AttachmentId, Attachment>,
    comments: BTreeMap<CommentId, CommentRecord>,
}

impl SiteState {
    fn new(info: SiteInfo) -> Self {
        Self {
            info,
            next_item: 1,
            next_term: 1,
            next_attachment: 1,
            next_comment: 1,
            items: BTreeMap::new(),
            terms: BTreeMap::new(),
            attachments: BTreeMap::new(),
            comments: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Network {
    sites: BTreeMap<SiteId, SiteState>,
    memberships: HashMap<(UserId, SiteId), HashSet<Capability>>,
    failing_urls: HashSet<String>,
    deletes: Vec<DeleteCall>,
    trashes: Vec<(SiteId, ItemId)>,
    sideloads: Vec<SideloadCall>,
}

impl Network {
    fn site(&self, site: SiteId) -> Result<&SiteState, StoreError> {
        self.sites
            .get(&site)
            .ok_or_else(|| StoreError(format!("no such site: {site}")))
    }

    fn site_mut(&mut self, site: SiteId) -> Result<&mut SiteState, StoreError> {
        self.sites
            .get_mut(&site)
            .ok_or_else(|| StoreError(format!("no such site: {site}")))
    }
}

/// In-memory multisite [`ContentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Network>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a site to the network.
    pub async fn add_site(&self, id: SiteId, name: &str, utc_offset_minutes: i32) {
        let mut net = self.inner.write().await;
        net.sites.insert(
            id,
            SiteState::new(SiteInfo {
                id,
                name: name.to_string(),
                utc_offset_minutes,
            }),
        );
    }

    /// Grant a user membership and capabilities on a site.
    pub async fn add_member(&self, user: UserId, site: SiteId, capabilities: &[Capability]) {
        let mut net = self.inner.write().await;
        net.memberships
            .entry((user, site))
            .or_default()
            .extend(capabilities.iter().copied());
    }

    /// Create an attachment from a URL and set it as the item's thumbnail.
    pub async fn attach_thumbnail(
        &self,
        site: SiteId,
        item: ItemId,
        url: &str,
    ) -> Result<AttachmentId, StoreError> {
        let mut net = self.inner.write().await;
        let state = net.site_mut(site)?;
        let id = state.next_attachment;
        state.next_attachment += 1;
        state.attachments.insert(
            id,
            Attachment {
                source_url: url.to_string(),
                attached_to: item,
            },
        );
        let entry = state
            .items
            .get_mut(&item)
            .ok_or_else(|| StoreError(format!("no such item: {item}")))?;
        entry.item.thumbnail = Some(id);
        Ok(id)
    }

    /// Make every future sideload of this exact URL fail.
    pub async fn fail_sideloads_of(&self, url: &str) {
        self.inner.write().await.failing_urls.insert(url.to_string());
    }

    /// All delete calls made so far, in order.
    pub async fn recorded_deletes(&self) -> Vec<DeleteCall> {
        self.inner.read().await.deletes.clone()
    }

    /// All trash calls made so far, in order.
    pub async fn recorded_trashes(&self) -> Vec<(SiteId, ItemId)> {
        self.inner.read().await.trashes.clone()
    }

    /// All sideload attempts made so far, in order.
    pub async fn recorded_sideloads(&self) -> Vec<SideloadCall> {
        self.inner.read().await.sideloads.clone()
    }

    /// Comments stored against an item.
    pub async fn comments_for(&self, site: SiteId, item: ItemId) -> Vec<CommentRecord> {
        let net = self.inner.read().await;
        match net.site(site) {
            Ok(state) => state
                .comments
                .values()
                .filter(|c| c.item == item)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Names of all terms of one taxonomy registered on a site.
    pub async fn term_names(&self, site: SiteId, taxonomy: &str) -> Vec<String> {
        let net = self.inner.read().await;
        match net.site(site) {
            Ok(state) => state
                .terms
                .values()
                .filter(|t| t.taxonomy == taxonomy)
                .map(|t| t.name.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Term names assigned to an item for one taxonomy.
    pub async fn assigned_terms(&self, site: SiteId, item: ItemId, taxonomy: &str) -> Vec<String> {
        let net = self.inner.read().await;
        net.site(site)
            .ok()
            .and_then(|s| s.items.get(&item))
            .and_then(|i| i.terms.get(taxonomy).cloned())
            .unwrap_or_default()
    }
}

impl ContentStore for MemoryStore {
    fn sites(&self) -> BoxFuture<'_, Vec<SiteInfo>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net.sites.values().map(|s| s.info.clone()).collect())
        })
    }

    fn site_info(&self, site: SiteId) -> BoxFuture<'_, Option<SiteInfo>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net.sites.get(&site).map(|s| s.info.clone()))
        })
    }

    fn is_member(&self, user: UserId, site: SiteId) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net.memberships.contains_key(&(user, site)))
        })
    }

    fn user_can(&self, user: UserId, site: SiteId, capability: Capability) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net
                .memberships
                .get(&(user, site))
                .is_some_and(|caps| caps.contains(&capability)))
        })
    }

    fn get_item(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, Option<ContentItem>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net.site(site)?.items.get(&item).map(|i| i.item.clone()))
        })
    }

    fn upsert_item(&self, site: SiteId, draft: ItemDraft) -> BoxFuture<'_, ItemId> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;

            let id = if draft.id == 0 {
                let id = state.next_item;
                state.next_item += 1;
                id
            } else {
                draft.id
            };

            let written = ContentItem {
                site,
                id,
                author: draft.author,
                title: draft.title,
                body: draft.body,
                excerpt: draft.excerpt,
                status: draft.status,
                content_type: draft.content_type,
                slug: draft.slug,
                published_at: draft.published_at,
                comments_open: draft.comments_open,
                pings_open: draft.pings_open,
                format: None,
                thumbnail: None,
            };

            match state.items.get_mut(&id) {
                Some(existing) => {
                    // Format and thumbnail are set through their own
                    // operations; an update keeps them.
                    let format = existing.item.format.clone();
                    let thumbnail = existing.item.thumbnail;
                    existing.item = written;
                    existing.item.format = format;
                    existing.item.thumbnail = thumbnail;
                    existing.terms.insert("tag".to_string(), draft.tags);
                }
                None => {
                    let mut terms = BTreeMap::new();
                    terms.insert("tag".to_string(), draft.tags);
                    state.items.insert(
                        id,
                        ItemState {
                            item: written,
                            meta: BTreeMap::new(),
                            custom: BTreeMap::new(),
                            terms,
                        },
                    );
                    if id >= state.next_item {
                        state.next_item = id + 1;
                    }
                }
            }

            Ok(id)
        })
    }

    fn delete_item(&self, site: SiteId, item: ItemId, force: bool) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            net.deletes.push(DeleteCall { site, item, force });
            let state = net.site_mut(site)?;
            if force {
                Ok(state.items.remove(&item).is_some())
            } else {
                match state.items.get_mut(&item) {
                    Some(entry) => {
                        entry.item.status = ItemStatus::Trashed;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        })
    }

    fn trash_item(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            net.trashes.push((site, item));
            let state = net.site_mut(site)?;
            match state.items.get_mut(&item) {
                Some(entry) => {
                    entry.item.status = ItemStatus::Trashed;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn item_taxonomies(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, Vec<String>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net
                .site(site)?
                .items
                .get(&item)
                .map(|i| i.terms.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn item_terms(
        &self,
        site: SiteId,
        item: ItemId,
        taxonomy: String,
    ) -> BoxFuture<'_, Vec<Term>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            let state = net.site(site)?;
            let names = state
                .items
                .get(&item)
                .and_then(|i| i.terms.get(&taxonomy))
                .cloned()
                .unwrap_or_default();
            Ok(names
                .into_iter()
                .map(|name| {
                    state
                        .terms
                        .values()
                        .find(|t| t.taxonomy == taxonomy && t.name == name)
                        .cloned()
                        .unwrap_or_else(|| Term {
                            taxonomy: taxonomy.clone(),
                            slug: name.to_lowercase().replace(' ', "-"),
                            description: String::new(),
                            name,
                        })
                })
                .collect())
        })
    }

    fn upsert_term(&self, site: SiteId, term: Term) -> BoxFuture<'_, TermId> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            if let Some((id, _)) = state
                .terms
                .iter()
                .find(|(_, t)| t.taxonomy == term.taxonomy && t.name == term.name)
            {
                return Ok(*id);
            }
            let id = state.next_term;
            state.next_term += 1;
            state.terms.insert(id, term);
            Ok(id)
        })
    }

    fn set_item_terms(
        &self,
        site: SiteId,
        item: ItemId,
        taxonomy: String,
        names: Vec<String>,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            let entry = state
                .items
                .get_mut(&item)
                .ok_or_else(|| StoreError(format!("no such item: {item}")))?;
            entry.terms.insert(taxonomy, names);
            Ok(())
        })
    }

    fn get_meta(
        &self,
        site: SiteId,
        item: ItemId,
        key: String,
    ) -> BoxFuture<'_, Option<serde_json::Value>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net
                .site(site)?
                .items
                .get(&item)
                .and_then(|i| i.meta.get(&key).cloned()))
        })
    }

    fn set_meta(
        &self,
        site: SiteId,
        item: ItemId,
        key: String,
        value: serde_json::Value,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            let entry = state
                .items
                .get_mut(&item)
                .ok_or_else(|| StoreError(format!("no such item: {item}")))?;
            entry.meta.insert(key, value);
            Ok(())
        })
    }

    fn custom_fields(
        &self,
        site: SiteId,
        item: ItemId,
    ) -> BoxFuture<'_, BTreeMap<String, serde_json::Value>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net
                .site(site)?
                .items
                .get(&item)
                .map(|i| i.custom.clone())
                .unwrap_or_default())
        })
    }

    fn set_custom_field(
        &self,
        site: SiteId,
        item: ItemId,
        key: String,
        value: serde_json::Value,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            let entry = state
                .items
                .get_mut(&item)
                .ok_or_else(|| StoreError(format!("no such item: {item}")))?;
            entry.custom.insert(key, value);
            Ok(())
        })
    }

    fn thumbnail_url(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move {
            let net = self.inner.read().await;
            let state = net.site(site)?;
            Ok(state
                .items
                .get(&item)
                .and_then(|i| i.item.thumbnail)
                .and_then(|a| state.attachments.get(&a))
                .map(|a| a.source_url.clone()))
        })
    }

    fn sideload_image(
        &self,
        site: SiteId,
        url: String,
        attach_to: ItemId,
    ) -> BoxFuture<'_, AttachmentId> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            if net.failing_urls.contains(&url) {
                net.sideloads.push(SideloadCall {
                    site,
                    url: url.clone(),
                    attach_to,
                    succeeded: false,
                });
                return Err(StoreError(format!("failed to fetch image: {url}")));
            }
            net.sideloads.push(SideloadCall {
                site,
                url: url.clone(),
                attach_to,
                succeeded: true,
            });
            let state = net.site_mut(site)?;
            let id = state.next_attachment;
            state.next_attachment += 1;
            state.attachments.insert(
                id,
                Attachment {
                    source_url: url,
                    attached_to: attach_to,
                },
            );
            Ok(id)
        })
    }

    fn set_thumbnail(
        &self,
        site: SiteId,
        item: ItemId,
        attachment: AttachmentId,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            let entry = state
                .items
                .get_mut(&item)
                .ok_or_else(|| StoreError(format!("no such item: {item}")))?;
            entry.item.thumbnail = Some(attachment);
            Ok(())
        })
    }

    fn clear_thumbnail(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            if let Some(entry) = state.items.get_mut(&item) {
                entry.item.thumbnail = None;
            }
            Ok(())
        })
    }

    fn set_format(
        &self,
        site: SiteId,
        item: ItemId,
        format: Option<String>,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            let entry = state
                .items
                .get_mut(&item)
                .ok_or_else(|| StoreError(format!("no such item: {item}")))?;
            entry.item.format = format;
            Ok(())
        })
    }

    fn insert_comment(&self, site: SiteId, comment: CommentDraft) -> BoxFuture<'_, CommentId> {
        Box::pin(async move {
            let mut net = self.inner.write().await;
            let state = net.site_mut(site)?;
            let id = state.next_comment;
            state.next_comment += 1;
            state.comments.insert(
                id,
                CommentRecord {
                    id,
                    item: comment.item,
                    author_name: comment.author_name,
                    body: comment.body,
                    parent: comment.parent,
                },
            );
            Ok(id)
        })
    }

    fn comment_count(&self, site: SiteId, item: ItemId) -> BoxFuture<'_, u64> {
        Box::pin(async move {
            let net = self.inner.read().await;
            Ok(net
                .site(site)?
                .comments
                .values()
                .filter(|c| c.item == item)
                .count() as u64)
        })
    }
}
