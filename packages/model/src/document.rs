//! Pages and the website document.

use serde::{Deserialize, Serialize};

use crate::{ids::HOME_PAGE_ID, Block};

/// Ordered collection of blocks plus display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,

    /// Always `slugify(name)`
    pub slug: String,

    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PageSettings>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Seo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
}

impl PageSettings {
    /// White background, 1100px content column
    pub fn standard() -> Self {
        Self {
            background_color: Some("#ffffff".to_string()),
            max_width: Some("1100px".to_string()),
        }
    }
}

/// Top-level document: ordered pages plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub pages: Vec<Page>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

/// Derive a URL slug from a page name: lowercase, whitespace runs become `-`
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut slug = String::with_capacity(lower.len());
    let mut in_whitespace = false;

    for ch in lower.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.push(ch);
            in_whitespace = false;
        }
    }

    slug
}

impl Page {
    /// Empty page; slug derived from `name`
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            slug: slugify(&name),
            name,
            blocks: Vec::new(),
            seo: None,
            settings: None,
        }
    }

    pub fn is_home(&self) -> bool {
        self.id == HOME_PAGE_ID
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    /// Blocks sorted by `order`; ties keep list position
    pub fn sorted_blocks(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.order);
        blocks
    }

    /// True when `order` values are exactly 0..n-1
    pub fn has_dense_order(&self) -> bool {
        let mut orders: Vec<usize> = self.blocks.iter().map(|b| b.order).collect();
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, order)| i == *order)
    }
}

impl Website {
    /// Default document: one empty home page
    pub fn bootstrap() -> Self {
        let mut home = Page::new(HOME_PAGE_ID, "Home");
        home.settings = Some(PageSettings::standard());

        Self {
            id: "website_1".to_string(),
            name: "My Website".to_string(),
            pages: vec![home],
            theme: None,
        }
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn page_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == page_id)
    }

    pub fn has_page(&self, page_id: &str) -> bool {
        self.page(page_id).is_some()
    }

    /// The page with id `home`, if the document still has one
    pub fn home_page(&self) -> Option<&Page> {
        self.page(HOME_PAGE_ID)
    }

    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }
}

impl Default for Website {
    fn default() -> Self {
        Self::bootstrap()
    }
}
