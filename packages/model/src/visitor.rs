use crate::*;

/// Visitor pattern for traversing a website immutably
///
/// Default implementations walk the whole tree. Override specific visit_*
/// methods to act on the nodes you care about.
pub trait Visitor: Sized {
    fn visit_website(&mut self, website: &Website) {
        walk_website(self, website);
    }

    fn visit_page(&mut self, page: &Page) {
        walk_page(self, page);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_video(&mut self, _block: &Block, _video: &VideoContent) {
        // Leaf
    }

    fn visit_gallery_image(&mut self, _block: &Block, _image: &GalleryImage) {
        // Leaf
    }

    fn visit_split_slot(&mut self, _block: &Block, _slot: &SplitSlot) {
        // Leaf
    }
}

pub fn walk_website<V: Visitor>(visitor: &mut V, website: &Website) {
    for page in &website.pages {
        visitor.visit_page(page);
    }
}

/// Walks blocks in `order`, not list position
pub fn walk_page<V: Visitor>(visitor: &mut V, page: &Page) {
    for block in page.sorted_blocks() {
        visitor.visit_block(block);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    match &block.content {
        BlockContent::Text(_) => {}
        BlockContent::Video(video) => visitor.visit_video(block, video),
        BlockContent::Gallery(gallery) => {
            for image in &gallery.images {
                visitor.visit_gallery_image(block, image);
            }
        }
        BlockContent::SplitView(split) => {
            visitor.visit_split_slot(block, &split.left_content);
            visitor.visit_split_slot(block, &split.right_content);
        }
    }
}

/// A media URL referenced from a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUrl {
    pub block_id: String,
    pub url: String,
}

#[derive(Default)]
struct AssetCollector {
    assets: Vec<AssetUrl>,
}

impl AssetCollector {
    fn push(&mut self, block: &Block, url: &str) {
        if !url.is_empty() {
            self.assets.push(AssetUrl {
                block_id: block.id.clone(),
                url: url.to_string(),
            });
        }
    }
}

impl Visitor for AssetCollector {
    fn visit_video(&mut self, block: &Block, video: &VideoContent) {
        self.push(block, &video.url);
        if let Some(thumbnail) = &video.thumbnail {
            self.push(block, thumbnail);
        }
    }

    fn visit_gallery_image(&mut self, block: &Block, image: &GalleryImage) {
        self.push(block, &image.url);
    }

    fn visit_split_slot(&mut self, block: &Block, slot: &SplitSlot) {
        if slot.kind == SlotKind::Image {
            self.push(block, &slot.content);
        }
    }
}

/// Every media URL the website references, in page then block order
pub fn collect_asset_urls(website: &Website) -> Vec<AssetUrl> {
    let mut collector = AssetCollector::default();
    collector.visit_website(website);
    collector.assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_collects_media_urls_in_block_order() {
        let now = chrono::Utc.timestamp_millis_opt(0).unwrap();
        let mut website = Website::bootstrap();
        let home = website.page_mut(HOME_PAGE_ID).unwrap();

        let mut video = Block::video("movie.mp4", 1, now);
        if let BlockContent::Video(v) = &mut video.content {
            v.thumbnail = Some("thumb.jpg".to_string());
        }
        home.blocks.push(video);
        home.blocks.push(Block::gallery(vec![GalleryImage::new("g1.jpg")], 0, now));
        home.blocks.push(Block::split_view(
            SplitSlot::image("left.jpg"),
            SplitSlot::text("<p>not a url</p>"),
            2,
            now,
        ));
        home.blocks.push(Block::text("<p>ignored</p>", 3, now));

        let urls: Vec<String> = collect_asset_urls(&website)
            .into_iter()
            .map(|a| a.url)
            .collect();

        assert_eq!(urls, vec!["g1.jpg", "movie.mp4", "thumb.jpg", "left.jpg"]);
    }
}
