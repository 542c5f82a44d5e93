// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Target-site resolution.
//!
//! Computes which destination sites an author may syndicate to: the
//! author must be a member of the site and hold both the publish and
//! edit-published capabilities there. A site failing the checks is
//! silently dropped; a permission failure is a filtering condition, not
//! a fault. The source site is never part of the output.
//!
//! Resolution is read-only. Store errors while probing a site are
//! treated the same as a failed check (logged at debug, site dropped).

use crate::store::{Capability, ContentStore, SiteId, UserId};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One eligible destination site, for the target checkbox list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteChoice {
    pub site: SiteId,
    pub name: String,
}

/// Read-only resolver over the network's membership and capability model.
pub struct SiteTargetResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for SiteTargetResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ContentStore> SiteTargetResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Whether the user may receive syndicated copies on this site:
    /// member, may publish, may edit published items.
    pub async fn can_for_site(&self, user: UserId, site: SiteId) -> bool {
        let member = match self.store.is_member(user, site).await {
            Ok(m) => m,
            Err(e) => {
                debug!(user, site, error = %e, "Membership probe failed, dropping site");
                return false;
            }
        };
        if !member {
            return false;
        }

        for capability in [Capability::Publish, Capability::EditPublished] {
            match self.store.user_can(user, site, capability).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(user, site, ?capability, "Capability missing, dropping site");
                    return false;
                }
                Err(e) => {
                    debug!(user, site, error = %e, "Capability probe failed, dropping site");
                    return false;
                }
            }
        }
        true
    }

    /// Every site (except `exclude`, the author's current site) the user
    /// can syndicate to, for the admin target list.
    pub async fn user_sites(&self, user: UserId, exclude: SiteId) -> Vec<SiteChoice> {
        let sites = match self.store.sites().await {
            Ok(sites) => sites,
            Err(e) => {
                debug!(user, error = %e, "Site listing failed");
                return Vec::new();
            }
        };

        let mut choices = Vec::new();
        for info in sites {
            if info.id == exclude {
                continue;
            }
            if self.can_for_site(user, info.id).await {
                choices.push(SiteChoice {
                    site: info.id,
                    name: info.name,
                });
            }
        }
        choices
    }

    /// Filter a requested target list down to the sites the author may
    /// actually syndicate to.
    ///
    /// Preserves the submitted order, drops duplicates and the source
    /// site, and silently filters sites failing the permission checks.
    pub async fn resolve(
        &self,
        author: UserId,
        source_site: SiteId,
        requested: &[SiteId],
    ) -> Vec<SiteId> {
        let mut resolved = Vec::new();
        for &site in requested {
            if site == source_site || resolved.contains(&site) {
                continue;
            }
            if self.can_for_site(author, site).await {
                resolved.push(site);
            }
        }
        resolved
    }
}
