//! # Pagecraft Model
//!
//! Value types for a single-page website document.
//!
//! ```text
//! Website
//!  └─ Page (ordered)
//!      └─ Block (ordered by `order`)
//!          ├─ text        opaque HTML
//!          ├─ video       url + playback flags
//!          ├─ gallery     ordered images
//!          └─ split-view  two slots + ratio
//! ```
//!
//! Nothing in here mutates a document. Editing lives in `pagecraft-editor`.

pub mod block;
pub mod document;
pub mod ids;
pub mod visitor;

pub use block::*;
pub use document::*;
pub use ids::{new_block_id, new_image_id, page_id_for, HOME_PAGE_ID};
pub use visitor::{collect_asset_urls, walk_block, walk_page, walk_website, AssetUrl, Visitor};

/// Timestamp type used for `createdAt` / `updatedAt`
pub type Timestamp = chrono::DateTime<chrono::Utc>;
