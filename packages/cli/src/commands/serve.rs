use crate::config::Config;
use anyhow::Result;
use chrono::Duration;
use clap::Args;
use colored::Colorize;
use pagecraft_workspace::{ApiState, FileGateway, LocalAssetStore};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the configured port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Build the API state described by `config`
pub fn api_state(config: &Config, cwd: &Path) -> ApiState {
    let storage_dir = config.get_storage_dir(cwd);
    let gateway = Arc::new(FileGateway::new(config.get_data_dir(cwd)));
    let assets = Arc::new(LocalAssetStore::new(
        &storage_dir,
        config.assets.bucket.clone(),
        config.base_url(),
        config.assets.signing_secret.clone(),
    ));

    let ttl = i64::try_from(config.assets.signed_url_ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| Duration::hours(1));

    ApiState::new(gateway, assets)
        .with_storage_dir(storage_dir)
        .with_signed_url_ttl(ttl)
}

pub async fn serve(args: ServeArgs, cwd: &Path) -> Result<()> {
    let mut config = Config::load(cwd)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    println!("{}", "🚀 Starting Pagecraft server...".bright_blue().bold());
    println!("   Data:    {}", config.get_data_dir(cwd).display());
    println!(
        "   Assets:  {}/{}",
        config.get_storage_dir(cwd).display(),
        config.assets.bucket
    );
    println!("   API:     http://{}/api/pages", config.listen_addr());
    println!();

    pagecraft_workspace::serve(&config.listen_addr(), api_state(&config, cwd)).await?;
    Ok(())
}
