//! # Block and Page Mutations
//!
//! Semantic operations on a [`Website`] document.
//!
//! ## Design Principles
//!
//! 1. **Pure**: `apply` takes the current document and returns the next one;
//!    the input is never touched
//! 2. **Silent on missing targets**: an unknown page or block id yields an
//!    [`MutationOutcome::Ignored`] with a reason, never an error
//! 3. **Invariant-preserving**: post-effects renumber block order and derive
//!    slugs after the primary change
//!
//! ## Ordering
//!
//! After any page-local mutation a page's `order` values are exactly
//! `0..n-1` and the block list is stored in that order.

use chrono::Duration;
use pagecraft_model::{
    page_id_for, Block, BlockContent, BlockKind, GalleryImage, GalleryLayout, Page,
    PageSettings, Seo, SplitRatio, SplitSlot, Timestamp, VerticalAlign, VideoStyles, Website,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::post_effects::{renumber, PostEffectEngine, Touch};

/// Semantic mutations on a website
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Mutation {
    /// Append a page with a generated id
    AddPage { page: NewPage },

    /// Merge fields into a page; a new name re-derives the slug
    #[serde(rename_all = "camelCase")]
    UpdatePage { page_id: String, update: PageUpdate },

    #[serde(rename_all = "camelCase")]
    DeletePage { page_id: String },

    /// Append a block at the end of a page
    #[serde(rename_all = "camelCase")]
    AddBlock { page_id: String, block: Block },

    /// Patch a block's content; `type` and `id` are immutable
    #[serde(rename_all = "camelCase")]
    UpdateBlock {
        page_id: String,
        block_id: String,
        patch: BlockPatch,
    },

    #[serde(rename_all = "camelCase")]
    DeleteBlock { page_id: String, block_id: String },

    /// Swap a block with its predecessor in `order`
    #[serde(rename_all = "camelCase")]
    MoveBlockUp { page_id: String, block_id: String },

    /// Swap a block with its successor in `order`
    #[serde(rename_all = "camelCase")]
    MoveBlockDown { page_id: String, block_id: String },

    /// Replace a page's blocks with the given sequence
    #[serde(rename_all = "camelCase")]
    ReorderBlocks { page_id: String, blocks: Vec<Block> },
}

/// Input for [`Mutation::AddPage`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPage {
    pub name: String,

    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PageSettings>,
}

impl NewPage {
    /// Empty page with the standard settings
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            seo: None,
            settings: Some(PageSettings::standard()),
        }
    }
}

/// Partial page fields for [`Mutation::UpdatePage`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PageSettings>,
}

impl PageUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Variant-typed partial block content
///
/// A patch only applies to a block of the same variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockPatch {
    Text(TextPatch),
    Video(VideoPatch),
    Gallery(GalleryPatch),
    SplitView(SplitViewPatch),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(rename = "loop", default, skip_serializing_if = "Option::is_none")]
    pub loop_playback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<VideoStyles>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GalleryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<GalleryImage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<GalleryLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SplitViewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_content: Option<SplitSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_content: Option<SplitSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<SplitRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,
}

impl BlockPatch {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPatch::Text(_) => BlockKind::Text,
            BlockPatch::Video(_) => BlockKind::Video,
            BlockPatch::Gallery(_) => BlockKind::Gallery,
            BlockPatch::SplitView(_) => BlockKind::SplitView,
        }
    }

    /// Merge into `content`, which must be the same variant
    pub fn apply_to(&self, content: &mut BlockContent) -> Result<(), NoOpReason> {
        match (self, content) {
            (BlockPatch::Text(patch), BlockContent::Text(text)) => {
                if let Some(html) = &patch.content {
                    text.content = html.clone();
                }
            }
            (BlockPatch::Video(patch), BlockContent::Video(video)) => {
                if let Some(url) = &patch.url {
                    video.url = url.clone();
                }
                if patch.thumbnail.is_some() {
                    video.thumbnail = patch.thumbnail.clone();
                }
                if patch.autoplay.is_some() {
                    video.autoplay = patch.autoplay;
                }
                if patch.loop_playback.is_some() {
                    video.loop_playback = patch.loop_playback;
                }
                if patch.muted.is_some() {
                    video.muted = patch.muted;
                }
                if patch.styles.is_some() {
                    video.styles = patch.styles.clone();
                }
            }
            (BlockPatch::Gallery(patch), BlockContent::Gallery(gallery)) => {
                if let Some(images) = &patch.images {
                    gallery.images = images.clone();
                }
                if patch.layout.is_some() {
                    gallery.layout = patch.layout;
                }
                if patch.columns.is_some() {
                    gallery.columns = patch.columns;
                }
                if patch.gap.is_some() {
                    gallery.gap = patch.gap.clone();
                }
            }
            (BlockPatch::SplitView(patch), BlockContent::SplitView(split)) => {
                if let Some(left) = &patch.left_content {
                    split.left_content = left.clone();
                }
                if let Some(right) = &patch.right_content {
                    split.right_content = right.clone();
                }
                if patch.ratio.is_some() {
                    split.ratio = patch.ratio;
                }
                if patch.vertical_align.is_some() {
                    split.vertical_align = patch.vertical_align;
                }
            }
            (patch, content) => {
                return Err(NoOpReason::KindMismatch {
                    block: content.kind(),
                    patch: patch.kind(),
                })
            }
        }
        Ok(())
    }
}

/// Why a mutation left the document unchanged
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoOpReason {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Block id already on page: {0}")]
    DuplicateBlockId(String),

    #[error("Cannot patch a {block} block with a {patch} patch")]
    KindMismatch { block: BlockKind, patch: BlockKind },

    #[error("Block is already first: {0}")]
    AlreadyFirst(String),

    #[error("Block is already last: {0}")]
    AlreadyLast(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Applied,
    Ignored(NoOpReason),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

/// Result of [`Mutation::apply`]: the next document and whether it changed
#[derive(Debug, Clone)]
pub struct Applied {
    pub website: Website,
    pub outcome: MutationOutcome,
}

impl Mutation {
    /// Debug name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddPage { .. } => "addPage",
            Mutation::UpdatePage { .. } => "updatePage",
            Mutation::DeletePage { .. } => "deletePage",
            Mutation::AddBlock { .. } => "addBlock",
            Mutation::UpdateBlock { .. } => "updateBlock",
            Mutation::DeleteBlock { .. } => "deleteBlock",
            Mutation::MoveBlockUp { .. } => "moveBlockUp",
            Mutation::MoveBlockDown { .. } => "moveBlockDown",
            Mutation::ReorderBlocks { .. } => "reorderBlocks",
        }
    }

    /// Page this mutation targets (None for `AddPage`, whose id is generated)
    pub fn page_id(&self) -> Option<&str> {
        match self {
            Mutation::AddPage { .. } => None,
            Mutation::UpdatePage { page_id, .. }
            | Mutation::DeletePage { page_id }
            | Mutation::AddBlock { page_id, .. }
            | Mutation::UpdateBlock { page_id, .. }
            | Mutation::DeleteBlock { page_id, .. }
            | Mutation::MoveBlockUp { page_id, .. }
            | Mutation::MoveBlockDown { page_id, .. }
            | Mutation::ReorderBlocks { page_id, .. } => Some(page_id),
        }
    }

    /// Compute the next document. `now` stamps ids and `updatedAt`.
    pub fn apply(&self, website: &Website, now: Timestamp) -> Applied {
        let mut next = website.clone();

        match self.apply_primary(&mut next, now) {
            Ok(touched_page) => {
                PostEffectEngine::new().run(self, &mut next, &touched_page, now);
                Applied {
                    website: next,
                    outcome: MutationOutcome::Applied,
                }
            }
            Err(reason) => Applied {
                website: website.clone(),
                outcome: MutationOutcome::Ignored(reason),
            },
        }
    }

    /// Apply the primary change in place, returning the id of the touched page
    fn apply_primary(&self, website: &mut Website, now: Timestamp) -> Result<String, NoOpReason> {
        match self {
            Mutation::AddPage { page } => Ok(Self::apply_add_page(website, page, now)),

            Mutation::UpdatePage { page_id, update } => {
                let page = find_page(website, page_id)?;
                if let Some(name) = &update.name {
                    page.name = name.clone();
                }
                if update.seo.is_some() {
                    page.seo = update.seo.clone();
                }
                if update.settings.is_some() {
                    page.settings = update.settings.clone();
                }
                Ok(page_id.clone())
            }

            Mutation::DeletePage { page_id } => {
                let pos = website
                    .pages
                    .iter()
                    .position(|p| p.id == *page_id)
                    .ok_or_else(|| NoOpReason::PageNotFound(page_id.clone()))?;
                website.pages.remove(pos);
                Ok(page_id.clone())
            }

            Mutation::AddBlock { page_id, block } => {
                let page = find_page(website, page_id)?;
                if page.block(&block.id).is_some() {
                    return Err(NoOpReason::DuplicateBlockId(block.id.clone()));
                }
                let mut block = block.clone();
                block.order = page.blocks.len();
                page.blocks.push(block);
                Ok(page_id.clone())
            }

            Mutation::UpdateBlock { page_id, block_id, patch } => {
                let page = find_page(website, page_id)?;
                let block = page
                    .blocks
                    .iter_mut()
                    .find(|b| b.id == *block_id)
                    .ok_or_else(|| NoOpReason::BlockNotFound(block_id.clone()))?;
                patch.apply_to(&mut block.content)?;
                block.touch(now);
                Ok(page_id.clone())
            }

            Mutation::DeleteBlock { page_id, block_id } => {
                let page = find_page(website, page_id)?;
                let pos = page
                    .blocks
                    .iter()
                    .position(|b| b.id == *block_id)
                    .ok_or_else(|| NoOpReason::BlockNotFound(block_id.clone()))?;
                page.blocks.remove(pos);
                Ok(page_id.clone())
            }

            Mutation::MoveBlockUp { page_id, block_id } => {
                let page = find_page(website, page_id)?;
                sort_by_order(page);
                let idx = block_index(page, block_id)?;
                if idx == 0 {
                    return Err(NoOpReason::AlreadyFirst(block_id.clone()));
                }
                page.blocks.swap(idx, idx - 1);
                renumber(&mut page.blocks, now, Touch::All);
                Ok(page_id.clone())
            }

            Mutation::MoveBlockDown { page_id, block_id } => {
                let page = find_page(website, page_id)?;
                sort_by_order(page);
                let idx = block_index(page, block_id)?;
                if idx + 1 >= page.blocks.len() {
                    return Err(NoOpReason::AlreadyLast(block_id.clone()));
                }
                page.blocks.swap(idx, idx + 1);
                renumber(&mut page.blocks, now, Touch::All);
                Ok(page_id.clone())
            }

            Mutation::ReorderBlocks { page_id, blocks } => {
                let page = find_page(website, page_id)?;
                let mut seen = HashSet::new();
                if let Some(dup) = blocks.iter().find(|b| !seen.insert(b.id.as_str())) {
                    return Err(NoOpReason::DuplicateBlockId(dup.id.clone()));
                }
                page.blocks = blocks.clone();
                renumber(&mut page.blocks, now, Touch::Changed);
                Ok(page_id.clone())
            }
        }
    }

    fn apply_add_page(website: &mut Website, input: &NewPage, now: Timestamp) -> String {
        let mut stamp = now;
        let mut id = page_id_for(stamp);
        while website.has_page(&id) {
            stamp += Duration::milliseconds(1);
            id = page_id_for(stamp);
        }

        let mut page = Page::new(id.clone(), input.name.clone());
        page.blocks = input.blocks.clone();
        page.seo = input.seo.clone();
        page.settings = input.settings.clone();
        website.pages.push(page);

        id
    }
}

fn find_page<'a>(website: &'a mut Website, page_id: &str) -> Result<&'a mut Page, NoOpReason> {
    website
        .page_mut(page_id)
        .ok_or_else(|| NoOpReason::PageNotFound(page_id.to_string()))
}

fn block_index(page: &Page, block_id: &str) -> Result<usize, NoOpReason> {
    page.blocks
        .iter()
        .position(|b| b.id == block_id)
        .ok_or_else(|| NoOpReason::BlockNotFound(block_id.to_string()))
}

fn sort_by_order(page: &mut Page) {
    page.blocks.sort_by_key(|b| b.order);
}
