// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Engine input and report types.

use crate::store::{ItemId, SiteId, UserId};
use serde::Serialize;
use std::collections::BTreeMap;

/// A save notification from the host, as received by the engine's entry
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveEvent {
    /// Site the save happened on.
    pub site: SiteId,
    /// The saved item.
    pub item: ItemId,
    /// The acting user (not necessarily the item's author).
    pub user: UserId,
    /// Autosaves are ignored wholesale.
    pub is_autosave: bool,
    /// Revision writes are ignored wholesale.
    pub is_revision: bool,
}

impl SaveEvent {
    /// A plain user-initiated save (not autosave, not revision).
    pub fn user_save(site: SiteId, item: ItemId, user: UserId) -> Self {
        Self {
            site,
            item,
            user,
            is_autosave: false,
            is_revision: false,
        }
    }
}

/// One destination-site failure absorbed during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteFailure {
    pub site: SiteId,
    /// Store operation that failed (e.g. `sideload_image`).
    pub operation: String,
    pub message: String,
}

/// The outcome of one reconciliation.
///
/// Failures here are site-scoped and already logged; the save entry
/// point returns the report instead of propagating them, so a broken
/// destination never aborts the author's save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// The persisted targets map after the pass.
    pub targets: BTreeMap<SiteId, ItemId>,
    /// Sites where a new destination copy was created.
    pub created: Vec<SiteId>,
    /// Sites where the existing copy was updated in place.
    pub updated: Vec<SiteId>,
    /// Sites whose destination copy was deleted (deselected).
    pub removed: Vec<SiteId>,
    /// Sites skipped because permission was lost between resolution and
    /// the per-site pass.
    pub skipped: Vec<SiteId>,
    /// Site-scoped failures, in encounter order.
    pub failures: Vec<SiteFailure>,
}

impl SyncReport {
    /// Whether every selected site was brought fully up to date.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }
}

/// The outcome of a lifecycle cascade (trash or delete).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Destination copies the cascade attempted.
    pub attempted: usize,
    /// Destination copies successfully trashed/deleted.
    pub completed: usize,
    /// Site-scoped failures, in encounter order.
    pub failures: Vec<SiteFailure>,
}
