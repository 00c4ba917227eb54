//! Tests for longer mutation sequences
//!
//! This tests:
//! - Dense ordering after mixed add / move / delete chains
//! - The add, add, move-up scenario end to end
//! - Page lifecycle chains

use chrono::{Duration, TimeZone, Utc};
use pagecraft_editor::model::{Block, BlockContent, TextContent, Timestamp, Website, HOME_PAGE_ID};
use pagecraft_editor::{Mutation, NewPage, PageUpdate};

fn at(millis: i64) -> Timestamp {
    Utc.timestamp_millis_opt(millis).unwrap()
}

fn assert_dense(website: &Website) {
    for page in &website.pages {
        assert!(
            page.has_dense_order(),
            "page {} has orders {:?}",
            page.id,
            page.blocks.iter().map(|b| b.order).collect::<Vec<_>>()
        );
    }
}

/// Small deterministic generator so failures replay
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[test]
fn test_add_then_move_sequences_stay_dense() {
    for seed in 0..50u64 {
        let mut rng = Lcg(seed);
        let mut website = Website::bootstrap();
        let mut now = at(0);
        let mut ids: Vec<String> = Vec::new();

        for step in 0..40 {
            now += Duration::milliseconds(1);
            let mutation = if ids.is_empty() || rng.next(3) == 0 {
                let count = website.home_page().unwrap().blocks.len();
                let block = Block::text(format!("<p>{}</p>", step), count, now);
                ids.push(block.id.clone());
                Mutation::AddBlock {
                    page_id: HOME_PAGE_ID.to_string(),
                    block,
                }
            } else {
                let block_id = ids[rng.next(ids.len())].clone();
                if rng.next(2) == 0 {
                    Mutation::MoveBlockUp {
                        page_id: HOME_PAGE_ID.to_string(),
                        block_id,
                    }
                } else {
                    Mutation::MoveBlockDown {
                        page_id: HOME_PAGE_ID.to_string(),
                        block_id,
                    }
                }
            };

            website = mutation.apply(&website, now).website;
            assert_dense(&website);
        }

        assert_eq!(website.home_page().unwrap().blocks.len(), ids.len());
    }
}

#[test]
fn test_deletes_mixed_in_stay_dense() {
    let mut rng = Lcg(7);
    let mut website = Website::bootstrap();
    let mut ids: Vec<String> = Vec::new();

    for step in 0..200 {
        let now = at(step);
        let mutation = match rng.next(4) {
            0 | 1 => {
                let block = Block::text("<p/>", 0, now);
                ids.push(block.id.clone());
                Mutation::AddBlock {
                    page_id: HOME_PAGE_ID.to_string(),
                    block,
                }
            }
            2 if !ids.is_empty() => {
                let block_id = ids.remove(rng.next(ids.len()));
                Mutation::DeleteBlock {
                    page_id: HOME_PAGE_ID.to_string(),
                    block_id,
                }
            }
            _ if !ids.is_empty() => Mutation::MoveBlockUp {
                page_id: HOME_PAGE_ID.to_string(),
                block_id: ids[rng.next(ids.len())].clone(),
            },
            _ => continue,
        };

        website = mutation.apply(&website, now).website;
        assert_dense(&website);
    }
}

#[test]
fn test_add_add_move_up_scenario() {
    let website = Website::bootstrap();

    let b1 = Block::with_id(
        "b1",
        BlockContent::Text(TextContent {
            content: "<p>hi</p>".to_string(),
        }),
        0,
        at(0),
    );
    let website = Mutation::AddBlock {
        page_id: HOME_PAGE_ID.to_string(),
        block: b1,
    }
    .apply(&website, at(0))
    .website;

    let home = website.home_page().unwrap();
    assert_eq!(home.blocks.len(), 1);
    assert_eq!(home.blocks[0].id, "b1");
    assert_eq!(home.blocks[0].order, 0);

    let mut b2 = Block::video("x.mp4", 1, at(1));
    b2.id = "b2".to_string();
    let website = Mutation::AddBlock {
        page_id: HOME_PAGE_ID.to_string(),
        block: b2,
    }
    .apply(&website, at(1))
    .website;

    let orders: Vec<(String, usize)> = website
        .home_page()
        .unwrap()
        .blocks
        .iter()
        .map(|b| (b.id.clone(), b.order))
        .collect();
    assert_eq!(orders, vec![("b1".to_string(), 0), ("b2".to_string(), 1)]);

    let website = Mutation::MoveBlockUp {
        page_id: HOME_PAGE_ID.to_string(),
        block_id: "b2".to_string(),
    }
    .apply(&website, at(10))
    .website;

    let home = website.home_page().unwrap();
    let sorted: Vec<(&str, usize)> = home
        .sorted_blocks()
        .iter()
        .map(|b| (b.id.as_str(), b.order))
        .collect();
    assert_eq!(sorted, vec![("b2", 0), ("b1", 1)]);
    assert!(home.blocks.iter().all(|b| b.updated_at == at(10)));
}

#[test]
fn test_page_lifecycle_chain() {
    let mut website = Website::bootstrap();

    website = Mutation::AddPage {
        page: NewPage::named("Our Team"),
    }
    .apply(&website, at(100))
    .website;
    website = Mutation::AddBlock {
        page_id: "page_100".to_string(),
        block: Block::text("<p>team</p>", 0, at(101)),
    }
    .apply(&website, at(101))
    .website;
    website = Mutation::UpdatePage {
        page_id: "page_100".to_string(),
        update: PageUpdate::rename("People"),
    }
    .apply(&website, at(102))
    .website;

    let page = website.page("page_100").unwrap();
    assert_eq!(page.slug, "people");
    assert_eq!(page.blocks.len(), 1);

    website = Mutation::DeletePage {
        page_id: "page_100".to_string(),
    }
    .apply(&website, at(103))
    .website;

    assert_eq!(website.pages.len(), 1);
    assert!(website.home_page().is_some());
}
