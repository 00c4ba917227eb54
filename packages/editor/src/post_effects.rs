//! # Post-Effect System
//!
//! Mutations trigger follow-up fixes that keep a page consistent:
//! - Adding, deleting or reordering blocks → renumber `order` to `0..n-1`
//! - Adding or renaming a page → re-derive the slug from the name
//!
//! Post-effects are:
//! - **Deterministic**: same mutation and document, same result
//! - **Local**: they only see the page the primary mutation touched
//! - **Idempotent**: running an effect twice changes nothing the second time

use crate::mutations::Mutation;
use pagecraft_model::{slugify, Block, Page, Timestamp, Website};

/// Which blocks get `updated_at` refreshed by [`renumber`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    /// Every block in the page
    All,
    /// Only blocks whose `order` changed
    Changed,
}

/// Assign `order = position` to every block, in list order
pub fn renumber(blocks: &mut [Block], now: Timestamp, touch: Touch) {
    for (position, block) in blocks.iter_mut().enumerate() {
        let changed = block.order != position;
        block.order = position;
        if touch == Touch::All || changed {
            block.touch(now);
        }
    }
}

/// Follow-up fix applied to the page a mutation touched
pub trait PostEffect: std::fmt::Debug + Send + Sync {
    /// Whether this effect runs after `mutation`
    fn triggered_by(&self, mutation: &Mutation) -> bool;

    fn apply(&self, page: &mut Page, now: Timestamp);
}

/// Restore a dense `0..n-1` block order, keeping the current relative order
#[derive(Debug)]
pub struct NormalizeBlockOrder;

impl PostEffect for NormalizeBlockOrder {
    fn triggered_by(&self, mutation: &Mutation) -> bool {
        matches!(
            mutation,
            Mutation::AddPage { .. }
                | Mutation::AddBlock { .. }
                | Mutation::DeleteBlock { .. }
                | Mutation::MoveBlockUp { .. }
                | Mutation::MoveBlockDown { .. }
                | Mutation::ReorderBlocks { .. }
        )
    }

    fn apply(&self, page: &mut Page, now: Timestamp) {
        page.blocks.sort_by_key(|b| b.order);
        renumber(&mut page.blocks, now, Touch::Changed);
    }
}

/// Keep `slug == slugify(name)`
#[derive(Debug)]
pub struct DeriveSlug;

impl PostEffect for DeriveSlug {
    fn triggered_by(&self, mutation: &Mutation) -> bool {
        matches!(mutation, Mutation::AddPage { .. } | Mutation::UpdatePage { .. })
    }

    fn apply(&self, page: &mut Page, _now: Timestamp) {
        let slug = slugify(&page.name);
        if page.slug != slug {
            page.slug = slug;
        }
    }
}

/// Runs every registered effect after a primary mutation
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Engine with the default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(NormalizeBlockOrder), Box::new(DeriveSlug)],
        }
    }

    /// Apply triggered effects to `page_id`. A page that no longer exists
    /// (deleted by the mutation) is skipped.
    pub fn run(&self, mutation: &Mutation, website: &mut Website, page_id: &str, now: Timestamp) {
        let Some(page) = website.page_mut(page_id) else {
            return;
        };

        for effect in &self.effects {
            if effect.triggered_by(mutation) {
                tracing::trace!("post-effect {:?} after {}", effect, mutation.name());
                effect.apply(page, now);
            }
        }
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}
