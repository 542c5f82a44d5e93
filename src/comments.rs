// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Comment redirection for syndicated copies.
//!
//! A destination copy carries no comments of its own. Comments
//! submitted against a copy are rerouted to the origin item, and the
//! copy reports the origin's comment count so every site shows the
//! same conversation.
//!
//! Host comment pipelines expose the submitted parent id at preprocess
//! time and want it rewritten at insert time, so the capture is split
//! across [`CommentMirror::on_comment_preprocess`] and
//! [`CommentMirror::on_comment_submit`]. The captured parent is
//! consumed exactly once.

use crate::config::SyndicationConfig;
use crate::error::{Result, SyndicationError};
use crate::link::{read_origin, OriginRef};
use crate::metrics;
use crate::store::{CommentDraft, CommentId, ContentStore, ItemId, SiteId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Reroutes comment traffic from destination copies to their origin.
pub struct CommentMirror<S: ContentStore> {
    store: Arc<S>,
    config: SyndicationConfig,
    // Parent id captured at preprocess, consumed at submit.
    pending_parent: Mutex<Option<CommentId>>,
}

impl<S: ContentStore> CommentMirror<S> {
    pub fn new(store: Arc<S>, config: SyndicationConfig) -> Self {
        Self {
            store,
            config,
            pending_parent: Mutex::new(None),
        }
    }

    /// Record the submitted parent id before the host rewrites the
    /// comment's target. Returns the draft unchanged.
    pub async fn on_comment_preprocess(&self, draft: CommentDraft) -> CommentDraft {
        let mut pending = self.pending_parent.lock().await;
        *pending = draft.parent;
        draft
    }

    /// Insert a submitted comment, rerouting it to the origin item when
    /// the commented item is a syndicated copy.
    ///
    /// Returns the id of the comment inserted at the origin, or `None`
    /// when the item is not a copy (the host inserts locally as usual).
    pub async fn on_comment_submit(
        &self,
        site: SiteId,
        draft: CommentDraft,
    ) -> Result<Option<CommentId>> {
        let parent = self.pending_parent.lock().await.take();

        if !self.config.settings.mirror_comments {
            return Ok(None);
        }

        let origin = match read_origin(self.store.as_ref(), site, draft.item).await? {
            Some(origin) => origin,
            None => return Ok(None),
        };

        let rerouted = CommentDraft {
            item: origin.item,
            parent: parent.or(draft.parent),
            ..draft
        };

        debug!(
            site,
            origin_site = origin.site,
            origin_item = origin.item,
            "Rerouting comment to origin item"
        );

        let id = self
            .store
            .insert_comment(origin.site, rerouted)
            .await
            .map_err(|e| SyndicationError::remote(origin.site, "insert_comment", e))?;
        metrics::record_comment_rerouted(origin.site);
        Ok(Some(id))
    }

    /// Report the comment count for an item, substituting the origin's
    /// count when the item is a syndicated copy.
    pub async fn on_count_comments(
        &self,
        site: SiteId,
        item: ItemId,
        local_count: u64,
    ) -> Result<u64> {
        if !self.config.settings.mirror_comments {
            return Ok(local_count);
        }
        match read_origin(self.store.as_ref(), site, item).await? {
            Some(OriginRef {
                site: origin_site,
                item: origin_item,
            }) => self
                .store
                .comment_count(origin_site, origin_item)
                .await
                .map_err(|e| SyndicationError::remote(origin_site, "comment_count", e)),
            None => Ok(local_count),
        }
    }
}
