//! Content blocks.
//!
//! A [`Block`] is the shared envelope (id, order, timestamps) around one of
//! four closed [`BlockContent`] variants. On the wire the variant is selected
//! by the `type` field and its fields sit next to the envelope's:
//!
//! ```json
//! { "id": "b1", "type": "text", "content": "<p>hi</p>", "order": 0,
//!   "createdAt": "...", "updatedAt": "..." }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ids::new_block_id, ids::new_image_id, Timestamp};

/// One content unit on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Opaque id, assigned at creation and never changed
    pub id: String,

    /// Zero-based position within the owning page
    pub order: usize,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    #[serde(flatten)]
    pub content: BlockContent,
}

/// Variant payloads, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockContent {
    Text(TextContent),
    Video(VideoContent),
    Gallery(GalleryContent),
    SplitView(SplitViewContent),
}

/// Fieldless discriminant of [`BlockContent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Text,
    Video,
    Gallery,
    SplitView,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Video => "video",
            BlockKind::Gallery => "gallery",
            BlockKind::SplitView => "split-view",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rich text, kept as the HTML string the text editor produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContent {
    pub url: String,

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

/// Free-form CSS sizing for a video
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryContent {
    #[serde(default)]
    pub images: Vec<GalleryImage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<GalleryLayout>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl GalleryImage {
    /// Image with a fresh id
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: new_image_id(),
            url: url.into(),
            alt: None,
            caption: None,
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLayout {
    Grid,
    Carousel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitViewContent {
    pub left_content: SplitSlot,
    pub right_content: SplitSlot,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<SplitRatio>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,
}

impl SplitViewContent {
    /// Ratio with the `50-50` default applied
    pub fn ratio(&self) -> SplitRatio {
        self.ratio.unwrap_or_default()
    }

    /// Alignment with the `top` default applied
    pub fn vertical_align(&self) -> VerticalAlign {
        self.vertical_align.unwrap_or_default()
    }
}

/// One side of a split view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSlot {
    #[serde(rename = "type")]
    pub kind: SlotKind,

    /// Image URL or HTML, depending on `kind`
    pub content: String,
}

impl SplitSlot {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: SlotKind::Image,
            content: url.into(),
        }
    }

    pub fn text(html: impl Into<String>) -> Self {
        Self {
            kind: SlotKind::Text,
            content: html.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Image,
    Text,
}

/// Left:right weight split of a split view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitRatio {
    #[default]
    #[serde(rename = "50-50")]
    FiftyFifty,
    #[serde(rename = "60-40")]
    SixtyForty,
    #[serde(rename = "40-60")]
    FortySixty,
    #[serde(rename = "70-30")]
    SeventyThirty,
    #[serde(rename = "30-70")]
    ThirtySeventy,
}

impl SplitRatio {
    pub const ALL: [SplitRatio; 5] = [
        SplitRatio::FiftyFifty,
        SplitRatio::SixtyForty,
        SplitRatio::FortySixty,
        SplitRatio::SeventyThirty,
        SplitRatio::ThirtySeventy,
    ];

    /// (left, right) weights, always summing to 100
    pub fn weights(&self) -> (u8, u8) {
        match self {
            SplitRatio::FiftyFifty => (50, 50),
            SplitRatio::SixtyForty => (60, 40),
            SplitRatio::FortySixty => (40, 60),
            SplitRatio::SeventyThirty => (70, 30),
            SplitRatio::ThirtySeventy => (30, 70),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitRatio::FiftyFifty => "50-50",
            SplitRatio::SixtyForty => "60-40",
            SplitRatio::FortySixty => "40-60",
            SplitRatio::SeventyThirty => "70-30",
            SplitRatio::ThirtySeventy => "30-70",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl BlockContent {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockContent::Text(_) => BlockKind::Text,
            BlockContent::Video(_) => BlockKind::Video,
            BlockContent::Gallery(_) => BlockKind::Gallery,
            BlockContent::SplitView(_) => BlockKind::SplitView,
        }
    }
}

impl Block {
    /// New block with a fresh id; `created_at == updated_at == now`
    pub fn new(content: BlockContent, order: usize, now: Timestamp) -> Self {
        Self::with_id(new_block_id(), content, order, now)
    }

    /// New block with a caller-chosen id
    pub fn with_id(id: impl Into<String>, content: BlockContent, order: usize, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            order,
            created_at: now,
            updated_at: now,
            content,
        }
    }

    pub fn text(html: impl Into<String>, order: usize, now: Timestamp) -> Self {
        Self::new(
            BlockContent::Text(TextContent { content: html.into() }),
            order,
            now,
        )
    }

    pub fn video(url: impl Into<String>, order: usize, now: Timestamp) -> Self {
        Self::new(
            BlockContent::Video(VideoContent {
                url: url.into(),
                ..Default::default()
            }),
            order,
            now,
        )
    }

    pub fn gallery(images: Vec<GalleryImage>, order: usize, now: Timestamp) -> Self {
        Self::new(
            BlockContent::Gallery(GalleryContent {
                images,
                ..Default::default()
            }),
            order,
            now,
        )
    }

    pub fn split_view(left: SplitSlot, right: SplitSlot, order: usize, now: Timestamp) -> Self {
        Self::new(
            BlockContent::SplitView(SplitViewContent {
                left_content: left,
                right_content: right,
                ratio: None,
                vertical_align: None,
            }),
            order,
            now,
        )
    }

    pub fn kind(&self) -> BlockKind {
        self.content.kind()
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> Timestamp {
        chrono::Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_new_block_stamps_both_timestamps() {
        let now = at(1_000);
        let block = Block::text("<p>hi</p>", 0, now);

        assert_eq!(block.created_at, now);
        assert_eq!(block.updated_at, now);
        assert_eq!(block.kind(), BlockKind::Text);
        assert!(!block.id.is_empty());
    }

    #[test]
    fn test_text_block_wire_shape() {
        let block = Block::with_id(
            "b1",
            BlockContent::Text(TextContent { content: "<p>hi</p>".into() }),
            0,
            at(0),
        );

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["id"], "b1");
        assert_eq!(json["content"], "<p>hi</p>");
        assert_eq!(json["order"], 0);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn test_split_view_parses_from_wire() {
        let json = r#"{
            "id": "split_1",
            "type": "split-view",
            "leftContent": { "type": "image", "content": "https://example.com/a.jpg" },
            "rightContent": { "type": "text", "content": "<h2>Hello</h2>" },
            "ratio": "30-70",
            "verticalAlign": "center",
            "order": 1,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;

        let block: Block = serde_json::from_str(json).unwrap();
        match &block.content {
            BlockContent::SplitView(split) => {
                assert_eq!(split.ratio(), SplitRatio::ThirtySeventy);
                assert_eq!(split.vertical_align(), VerticalAlign::Center);
                assert_eq!(split.left_content.kind, SlotKind::Image);
                assert_eq!(split.right_content.content, "<h2>Hello</h2>");
            }
            other => panic!("Expected split view, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_split_view_defaults() {
        let block = Block::split_view(SplitSlot::image("a.jpg"), SplitSlot::text("<p/>"), 0, at(0));
        let BlockContent::SplitView(split) = &block.content else {
            panic!("Expected split view");
        };
        assert_eq!(split.ratio(), SplitRatio::FiftyFifty);
        assert_eq!(split.vertical_align(), VerticalAlign::Top);

        let json = serde_json::to_value(&block).unwrap();
        assert!(json.get("ratio").is_none());
    }

    #[test]
    fn test_video_loop_flag_uses_keyword_name() {
        let json = r#"{
            "id": "v", "type": "video", "url": "x.mp4", "loop": true, "muted": false,
            "styles": { "aspectRatio": "16/9" },
            "order": 0, "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"
        }"#;

        let block: Block = serde_json::from_str(json).unwrap();
        let BlockContent::Video(video) = &block.content else {
            panic!("Expected video");
        };
        assert_eq!(video.loop_playback, Some(true));
        assert_eq!(video.muted, Some(false));
        assert_eq!(video.autoplay, None);
        assert_eq!(
            video.styles.as_ref().and_then(|s| s.aspect_ratio.as_deref()),
            Some("16/9")
        );
    }

    #[test]
    fn test_ratio_weights_sum_to_hundred() {
        for ratio in SplitRatio::ALL {
            let (left, right) = ratio.weights();
            assert_eq!(left as u32 + right as u32, 100, "{}", ratio.as_str());
        }
    }

    #[test]
    fn test_gallery_layout_tokens() {
        let content = GalleryContent {
            images: vec![GalleryImage::new("a.jpg").with_alt("A")],
            layout: Some(GalleryLayout::Carousel),
            columns: Some(3),
            gap: None,
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["layout"], "carousel");
        assert_eq!(json["images"][0]["alt"], "A");
        assert!(json["images"][0].get("caption").is_none());
    }
}
