//! # Pagecraft Editor
//!
//! Editing engine for Pagecraft websites.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Website → Page → Block               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: mutations + sync                    │
//! │  - Pure mutations with post-effects         │
//! │  - Optimistic local state (SiteStore)       │
//! │  - Fire-and-forget versioned upserts        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ gateway: get / insert / update / upsert     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Local state leads**: the in-memory website is always ahead of or
//!    equal to the remote copy
//! 2. **Missing ids are no-ops**: rapid UI actions may race; nothing panics
//!    or errors on a stale id
//! 3. **Newest write wins**: writes carry a version, stale acks are dropped
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{MemoryGateway, NewPage, SiteStore};
//!
//! let store = SiteStore::new(MemoryGateway::new());
//! store.load(42).await;
//! store.add_page(NewPage::named("About Us"));
//! store.flush().await;
//! ```

mod errors;
mod gateway;
mod memory;
mod mutations;
mod post_effects;
mod session;

pub use errors::GatewayError;
pub use gateway::{DocumentId, RemoteGateway, StoredDocument};
pub use memory::MemoryGateway;
pub use mutations::{
    Applied, BlockPatch, GalleryPatch, Mutation, MutationOutcome, NewPage, NoOpReason,
    PageUpdate, SplitViewPatch, TextPatch, VideoPatch,
};
pub use post_effects::{DeriveSlug, NormalizeBlockOrder, PostEffect, PostEffectEngine};
pub use session::{FetchOutcome, SiteStore, StoreState};

// Re-export the model for convenience
pub use pagecraft_model as model;
