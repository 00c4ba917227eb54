use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::RemoteGateway;
use pagecraft_model::Website;
use pagecraft_workspace::FileGateway;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Port for the API server
    #[arg(short, long, default_value_t = 3030)]
    pub port: u16,

    /// Directory for website documents
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    /// Skip creating the starter website
    #[arg(long)]
    pub no_seed: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub async fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Pagecraft project...".bright_blue().bold());

    let config = Config {
        port: args.port,
        data_dir: args.data_dir.clone(),
        ..Config::default()
    };

    let data_dir = config.get_data_dir(cwd);
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
        println!("  {} Created {}/", "✓".green(), config.data_dir);
    }

    let bucket_dir = config.get_storage_dir(cwd).join(&config.assets.bucket);
    if !bucket_dir.exists() {
        fs::create_dir_all(&bucket_dir)?;
        println!(
            "  {} Created {}/{}/",
            "✓".green(),
            config.assets.root_dir,
            config.assets.bucket
        );
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let mut site_id = None;
    if !args.no_seed {
        let gateway = FileGateway::new(&data_dir);
        if gateway.list_ids().await?.is_empty() {
            let stored = gateway.insert(&Website::bootstrap(), 0).await?;
            println!("  {} Created starter website #{}", "✓".green(), stored.id);
            site_id = Some(stored.id);
        }
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: pagecraft serve");
    match site_id {
        Some(id) => println!("  2. Run: pagecraft show --id {}", id),
        None => println!("  2. Run: pagecraft show --id <ID>"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args() -> InitArgs {
        InitArgs {
            port: 4000,
            data_dir: "sites".to_string(),
            no_seed: false,
            force: false,
        }
    }

    #[tokio::test]
    async fn test_init_writes_config_and_starter_site() {
        let dir = TempDir::new().unwrap();

        init(args(), dir.path()).await.unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.data_dir, "sites");
        assert_eq!(config.assets.signing_secret.len(), 32);
        assert_eq!(
            Config::load(dir.path()).unwrap().assets.signing_secret,
            config.assets.signing_secret
        );
        assert!(dir.path().join("storage/images").is_dir());

        let stored = FileGateway::new(dir.path().join("sites")).get(1).await.unwrap();
        assert_eq!(stored.data, Website::bootstrap());
    }

    #[tokio::test]
    async fn test_init_keeps_existing_config_without_force() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "port": 9999 }"#).unwrap();

        init(args(), dir.path()).await.unwrap();

        assert_eq!(Config::load(dir.path()).unwrap().port, 9999);
        assert!(!dir.path().join("sites").exists());
    }

    #[tokio::test]
    async fn test_init_does_not_seed_twice() {
        let dir = TempDir::new().unwrap();
        init(args(), dir.path()).await.unwrap();

        init(InitArgs { force: true, ..args() }, dir.path()).await.unwrap();

        let ids = FileGateway::new(dir.path().join("sites")).list_ids().await.unwrap();
        assert_eq!(ids, vec![1]);
    }
}
