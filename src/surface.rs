// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Editing-surface support: the data behind the target-site picker.
//!
//! Hosts render a checkbox per eligible destination site on the source
//! item's edit screen. When the item's author is swapped in the editor,
//! the picker is rebuilt for the new author through a token-guarded
//! refresh endpoint, since the eligible site set is per-author.

use crate::config::SyndicationConfig;
use crate::error::{Result, SyndicationError};
use crate::resolver::SiteTargetResolver;
use crate::state::SyncStateStore;
use crate::store::{ContentStore, ItemId, SiteId, UserId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// One entry in the rendered target-site picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetChoice {
    pub site: SiteId,
    pub name: String,
    pub selected: bool,
}

/// Payload for the author-swap refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSitesResponse {
    /// Eligible destination sites for the new author, by id.
    pub sites: BTreeMap<SiteId, String>,
    /// Sites already selected on the item, so the picker can keep the
    /// overlap checked.
    pub existing_selection: BTreeSet<SiteId>,
}

/// Single-use, expiring request tokens for the refresh endpoint.
///
/// A token is minted when the edit screen renders and spent on the
/// first refresh call. Replays and expired tokens are rejected.
pub struct TokenIssuer {
    ttl: Duration,
    issued: Mutex<HashMap<String, Instant>>,
}

impl TokenIssuer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a fresh token.
    pub async fn issue(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let mut issued = self.issued.lock().await;
        issued.retain(|_, minted| minted.elapsed() < self.ttl);
        issued.insert(token.clone(), Instant::now());
        token
    }

    /// Spend a token. Fails on unknown, replayed, or expired tokens.
    pub async fn consume(&self, token: &str) -> Result<()> {
        let mut issued = self.issued.lock().await;
        match issued.remove(token) {
            Some(minted) if minted.elapsed() < self.ttl => Ok(()),
            _ => Err(SyndicationError::TokenRejected),
        }
    }
}

/// The edit-screen data provider.
pub struct EditSurface<S: ContentStore> {
    config: SyndicationConfig,
    resolver: SiteTargetResolver<S>,
    state: SyncStateStore<S>,
    tokens: TokenIssuer,
}

impl<S: ContentStore> EditSurface<S> {
    pub fn new(store: Arc<S>, config: SyndicationConfig) -> Self {
        let tokens = TokenIssuer::new(Duration::from_secs(config.tokens.ttl_secs));
        Self {
            resolver: SiteTargetResolver::new(Arc::clone(&store)),
            state: SyncStateStore::new(store),
            tokens,
            config,
        }
    }

    /// Fail fast when the configuration cannot drive a picker at all.
    pub fn ensure_configured(&self) -> Result<()> {
        self.config.validate()
    }

    /// Mint a refresh token for a freshly rendered edit screen.
    pub async fn issue_token(&self) -> String {
        self.tokens.issue().await
    }

    /// The picker rows for an item's current author: every eligible
    /// destination site, with the recorded selection pre-checked.
    pub async fn target_choices(
        &self,
        author: UserId,
        source_site: SiteId,
        source_item: ItemId,
    ) -> Result<Vec<TargetChoice>> {
        let selected = self.state.selected_sites(source_site, source_item).await?;
        let choices = self
            .resolver
            .user_sites(author, source_site)
            .await
            .into_iter()
            .map(|choice| TargetChoice {
                selected: selected.contains(&choice.site),
                site: choice.site,
                name: choice.name,
            })
            .collect();
        Ok(choices)
    }

    /// Author-swap refresh: rebuild the eligible-site list for the new
    /// author. The token is spent whether or not the author has any
    /// eligible sites.
    pub async fn refresh_author_sites(
        &self,
        token: &str,
        author: UserId,
        source_site: SiteId,
        source_item: ItemId,
    ) -> Result<AuthorSitesResponse> {
        self.tokens.consume(token).await?;

        let sites: BTreeMap<SiteId, String> = self
            .resolver
            .user_sites(author, source_site)
            .await
            .into_iter()
            .map(|choice| (choice.site, choice.name))
            .collect();
        let existing_selection = self.state.selected_sites(source_site, source_item).await?;

        debug!(
            author,
            site = source_site,
            item = source_item,
            eligible = sites.len(),
            "Rebuilt target picker for new author"
        );
        Ok(AuthorSitesResponse {
            sites,
            existing_selection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::{Capability, ItemDraft, ItemStatus};
    use chrono::NaiveDate;

    fn publishing() -> [Capability; 2] {
        [Capability::Publish, Capability::EditPublished]
    }

    fn draft(title: &str) -> ItemDraft {
        ItemDraft {
            id: 0,
            author: 7,
            title: title.to_string(),
            body: String::new(),
            excerpt: String::new(),
            status: ItemStatus::Published,
            content_type: "post".to_string(),
            slug: title.to_lowercase(),
            published_at: NaiveDate::from_ymd_opt(2026, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap(),
            comments_open: true,
            pings_open: true,
            tags: Vec::new(),
        }
    }

    async fn network() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_site(1, "Origin", 0).await;
        store.add_site(2, "Regional", 60).await;
        store.add_site(3, "Archive", -300).await;
        store.add_member(7, 1, &publishing()).await;
        store.add_member(7, 2, &publishing()).await;
        store.add_member(7, 3, &[Capability::Publish]).await;
        store.add_member(8, 3, &publishing()).await;
        store
    }

    #[tokio::test]
    async fn choices_cover_eligible_sites_with_selection_checked() {
        let store = network().await;
        let surface = EditSurface::new(Arc::clone(&store), SyndicationConfig::for_testing());

        let item = store.upsert_item(1, draft("Picked")).await.unwrap();
        let selected: BTreeSet<SiteId> = [2].into_iter().collect();
        surface
            .state
            .set_selected_sites(1, item, &selected)
            .await
            .unwrap();

        let choices = surface.target_choices(7, 1, item).await.unwrap();
        assert_eq!(
            choices,
            vec![TargetChoice {
                site: 2,
                name: "Regional".to_string(),
                selected: true,
            }]
        );
    }

    #[tokio::test]
    async fn author_swap_refresh_reports_the_new_authors_sites() {
        let store = network().await;
        let surface = EditSurface::new(Arc::clone(&store), SyndicationConfig::for_testing());

        let token = surface.issue_token().await;
        let response = surface.refresh_author_sites(&token, 8, 1, 10).await.unwrap();
        assert_eq!(
            response.sites,
            [(3, "Archive".to_string())].into_iter().collect()
        );
        assert!(response.existing_selection.is_empty());
    }

    #[tokio::test]
    async fn tokens_are_single_use() {
        let store = network().await;
        let surface = EditSurface::new(Arc::clone(&store), SyndicationConfig::for_testing());

        let token = surface.issue_token().await;
        surface.refresh_author_sites(&token, 7, 1, 10).await.unwrap();
        let replay = surface.refresh_author_sites(&token, 7, 1, 10).await;
        assert!(matches!(replay, Err(SyndicationError::TokenRejected)));
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected() {
        let store = network().await;
        let surface = EditSurface::new(store, SyndicationConfig::for_testing());
        let result = surface.refresh_author_sites("bogus", 7, 1, 10).await;
        assert!(matches!(result, Err(SyndicationError::TokenRejected)));
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new(Duration::from_secs(0));
        let token = issuer.issue().await;
        assert!(matches!(
            issuer.consume(&token).await,
            Err(SyndicationError::TokenRejected)
        ));
    }

    #[tokio::test]
    async fn misconfiguration_is_reported_up_front() {
        let store = network().await;
        let mut config = SyndicationConfig::for_testing();
        config.content_types.clear();
        let surface = EditSurface::new(store, config);
        assert!(matches!(
            surface.ensure_configured(),
            Err(SyndicationError::Config(_))
        ));
    }
}
