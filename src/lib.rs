//! # Syndication Engine
//!
//! A cross-site content syndication engine for multisite content networks.
//!
//! ## Architecture
//!
//! The engine sits between a host's save pipeline and a multisite
//! [`ContentStore`], mirroring source items onto author-selected
//! destination sites:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         syndication-engine                           │
//! │                                                                      │
//! │  ┌────────────────────┐   ┌───────────────────┐   ┌───────────────┐  │
//! │  │ SiteTargetResolver │──►│ SyndicationEngine │──►│ per-site pass │  │
//! │  │ (capability check) │   │ (ordered          │   │ (terms, image,│  │
//! │  └────────────────────┘   │  reconciliation)  │   │  origin link) │  │
//! │                           └───────────────────┘   └───────────────┘  │
//! │         ┌──────────────────────┼──────────────────────┐              │
//! │         ▼                      ▼                      ▼              │
//! │  ┌───────────────┐   ┌─────────────────┐   ┌──────────────────┐      │
//! │  │ SyncStateStore│   │ LifecycleMirror │   │ CommentMirror    │      │
//! │  │ (targets map) │   │ (delete/trash)  │   │ (reroute to hub) │      │
//! │  └───────────────┘   └─────────────────┘   └──────────────────┘      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reconciliation Model
//!
//! 1. **Resolve**: intersect the author's submitted site list with the
//!    sites where they hold publishing rights.
//! 2. **Reconcile**: delete copies on deselected sites, then create or
//!    update a copy per effective site, strictly in submitted order.
//!
//! Every destination write happens under a [`guard::ReentrancyGate`]
//! suppression scope, so the engine's own writes never re-trigger it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use syndication_engine::{
//!     MemoryStore, SaveEvent, SyndicationConfig, SyndicationEngine,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let engine = SyndicationEngine::new(store, SyndicationConfig::default())
//!         .expect("invalid configuration");
//!
//!     let report = engine
//!         .handle_save(SaveEvent::user_save(1, 42, 7), &[2, 3])
//!         .await
//!         .expect("sync failed");
//!     println!("created on {:?}, updated on {:?}", report.created, report.updated);
//! }
//! ```

pub mod comments;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod link;
pub mod memory;
pub mod metrics;
pub mod resolver;
pub mod state;
pub mod store;
pub mod surface;

// Re-exports for convenience
pub use comments::CommentMirror;
pub use config::{SyncSettings, SyndicationConfig, TokenConfig};
pub use engine::{CascadeReport, SaveEvent, SiteFailure, SyncReport, SyndicationEngine};
pub use error::{Result, SyndicationError};
pub use guard::ReentrancyGate;
pub use lifecycle::LifecycleMirror;
pub use link::{MasterLinkIndex, OriginRef};
pub use memory::MemoryStore;
pub use resolver::{SiteChoice, SiteTargetResolver};
pub use state::SyncStateStore;
pub use store::{
    Capability, CommentDraft, CommentRecord, ContentItem, ContentStore, ItemDraft, ItemStatus,
    SiteInfo, Term,
};
pub use surface::{AuthorSitesResponse, EditSurface, TargetChoice, TokenIssuer};
