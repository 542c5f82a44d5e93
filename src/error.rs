// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the syndication engine.
//!
//! Errors are categorized by how far they are allowed to propagate.
//! A failure while writing one destination site must never abort the
//! sibling sites, so site-scoped errors are collected into the sync
//! report rather than returned from the save entry point.
//!
//! # Error Categories
//!
//! | Error Type | Site-scoped | Description |
//! |------------|-------------|-------------|
//! | `RemoteWrite` | Yes | A store operation against one destination site failed |
//! | `SiteUnavailable` | Yes | A recorded target site no longer exists in the network |
//! | `Config` | No | Required setup parameter missing (e.g. no eligible content types) |
//! | `State` | No | Sync-state metadata on the origin item is corrupt |
//! | `ItemNotFound` | No | The item a handler was invoked for does not exist |
//! | `OriginLocked` | No | A syndicated copy was edited directly instead of its origin |
//! | `TokenRejected` | No | The single-use request token failed validation |
//! | `Reentrancy` | Fatal | The save handler fired while suppression was active |
//!
//! # Propagation Policy
//!
//! Use [`SyndicationError::is_site_scoped()`] to decide whether a failure
//! is absorbed at site granularity. [`SyndicationError::is_fatal()`] marks
//! conditions that cannot occur by construction; observing one means the
//! suppression bookkeeping is broken and syncing must stop.

use crate::store::{ItemId, SiteId, StoreError};
use thiserror::Error;

/// Result type alias for syndication operations.
pub type Result<T> = std::result::Result<T, SyndicationError>;

/// Errors that can occur while syndicating content.
#[derive(Error, Debug)]
pub enum SyndicationError {
    /// Invalid or missing configuration.
    ///
    /// Surfaces as a blocking notice before any sync runs; never raised
    /// mid-reconciliation.
    #[error("configuration error: {0}")]
    Config(String),

    /// A store write against one destination site failed.
    ///
    /// Site-scoped: aborts the remaining sub-steps for that site only.
    /// Sibling sites keep their changes, there is no retry.
    #[error("store error on site {site} ({operation}): {message}")]
    RemoteWrite {
        site: SiteId,
        operation: String,
        message: String,
    },

    /// A recorded target site is no longer part of the network.
    ///
    /// Site-scoped: the site is dropped from the pass and reported.
    #[error("site {0} is not part of the network")]
    SiteUnavailable(SiteId),

    /// The item a handler was invoked for does not exist.
    #[error("item {item} not found on site {site}")]
    ItemNotFound { site: SiteId, item: ItemId },

    /// A syndicated copy was edited directly.
    ///
    /// Copies are read-only mirrors; all edits go through the origin item.
    #[error("item {item} on site {site} is a syndicated copy of item {origin_item} on site {origin_site}; edit the origin instead")]
    OriginLocked {
        site: SiteId,
        item: ItemId,
        origin_site: SiteId,
        origin_item: ItemId,
    },

    /// Sync-state metadata stored on an item failed to decode.
    ///
    /// Indicates the metadata was hand-edited or written by an
    /// incompatible version. Needs operator attention.
    #[error("sync state metadata is corrupt: {0}")]
    State(String),

    /// The single-use request token was unknown, expired, or reused.
    #[error("request token rejected")]
    TokenRejected,

    /// The save handler fired while suppression was active.
    ///
    /// Must never occur by construction: suppression is matched precisely
    /// around each destination write. Treated as a fatal assertion, not a
    /// recoverable condition.
    #[error("save handler re-entered while write suppression was active")]
    Reentrancy,
}

impl SyndicationError {
    /// Wrap a [`StoreError`] from an operation against one site.
    pub fn remote(site: SiteId, operation: impl Into<String>, source: StoreError) -> Self {
        Self::RemoteWrite {
            site,
            operation: operation.into(),
            message: source.to_string(),
        }
    }

    /// Check whether this error is absorbed at site granularity.
    ///
    /// Site-scoped errors are recorded in the sync report and never abort
    /// the overall save request.
    pub fn is_site_scoped(&self) -> bool {
        matches!(self, Self::RemoteWrite { .. } | Self::SiteUnavailable(_))
    }

    /// Check whether this error indicates broken invariants.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Reentrancy)
    }
}
