use crate::config::Config;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{DocumentId, FetchOutcome, RemoteGateway, SiteStore};
use pagecraft_model::{collect_asset_urls, BlockKind, Website};
use pagecraft_workspace::{FileGateway, HttpGateway};
use std::path::Path;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Website id
    #[arg(long, default_value_t = 1)]
    pub id: DocumentId,

    /// Read through a running server instead of the data directory
    #[arg(short, long)]
    pub server: Option<String>,

    /// List every media URL the website references
    #[arg(short, long)]
    pub assets: bool,
}

pub async fn show(args: ShowArgs, cwd: &Path) -> Result<()> {
    let website = match &args.server {
        Some(url) => load(HttpGateway::new(url.as_str()), args.id).await?,
        None => {
            let config = Config::load(cwd)?;
            load(FileGateway::new(config.get_data_dir(cwd)), args.id).await?
        }
    };

    print!("{}", render_summary(args.id, &website, args.assets));
    Ok(())
}

async fn load<G: RemoteGateway>(gateway: G, id: DocumentId) -> Result<Website> {
    let store = SiteStore::new(gateway);
    match store.load(id).await {
        FetchOutcome::Loaded => Ok(store.website()),
        _ => {
            let state = store.snapshot();
            bail!(state
                .error
                .unwrap_or_else(|| format!("Could not load website {}", id)))
        }
    }
}

fn render_summary(id: DocumentId, website: &Website, list_assets: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} {}\n",
        "🌐".bright_blue(),
        website.name.bright_white().bold(),
        format!("#{}", id).dimmed()
    ));

    for page in &website.pages {
        let kinds = [
            BlockKind::Text,
            BlockKind::Video,
            BlockKind::Gallery,
            BlockKind::SplitView,
        ]
        .iter()
        .filter_map(|kind| {
            let count = page.blocks.iter().filter(|b| b.kind() == *kind).count();
            (count > 0).then(|| format!("{} {}", count, kind))
        })
        .collect::<Vec<_>>();

        let detail = if kinds.is_empty() {
            "empty".to_string()
        } else {
            kinds.join(", ")
        };
        out.push_str(&format!(
            "  {} {} {} ({})\n",
            "•".green(),
            page.name,
            format!("/{}", page.slug).dimmed(),
            detail
        ));
    }

    let assets = collect_asset_urls(website);
    out.push_str(&format!(
        "  {} pages, {} blocks, {} media references\n",
        website.pages.len(),
        website.block_count(),
        assets.len()
    ));

    if list_assets {
        for asset in &assets {
            out.push_str(&format!("    {} {}\n", asset.block_id.dimmed(), asset.url));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_editor::MemoryGateway;
    use pagecraft_model::{Block, GalleryImage, HOME_PAGE_ID};

    fn sample() -> Website {
        let now = chrono::Utc::now();
        let mut website = Website::bootstrap();
        let home = website.page_mut(HOME_PAGE_ID).unwrap();
        home.blocks.push(Block::text("<p>Hi</p>", 0, now));
        home.blocks.push(Block::gallery(
            vec![GalleryImage::new("a.jpg"), GalleryImage::new("b.jpg")],
            1,
            now,
        ));
        website
    }

    #[test]
    fn test_summary_counts_blocks_and_media() {
        colored::control::set_override(false);
        let summary = render_summary(1, &sample(), true);

        assert!(summary.contains("My Website #1"));
        assert!(summary.contains("Home /home (1 text, 1 gallery)"));
        assert!(summary.contains("1 pages, 2 blocks, 2 media references"));
        assert!(summary.contains("a.jpg"));
    }

    #[tokio::test]
    async fn test_load_missing_website_fails() {
        let err = load(MemoryGateway::new(), 5).await.unwrap_err();
        assert!(err.to_string().contains("5"));
    }

    #[tokio::test]
    async fn test_load_returns_stored_website() {
        let website = sample();
        let loaded = load(MemoryGateway::with_document(2, website.clone()), 2)
            .await
            .unwrap();
        assert_eq!(loaded, website);
    }
}
