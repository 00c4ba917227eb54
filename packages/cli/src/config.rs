use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Pagecraft configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Port the API server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one JSON file per website
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default)]
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Directory served under `/storage`
    #[serde(default = "default_storage_dir")]
    pub root_dir: String,

    /// Prefix for public URLs; derived from the port when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,

    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
}

fn default_port() -> u16 {
    3030
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_bucket() -> String {
    "images".to_string()
}

fn default_storage_dir() -> String {
    "storage".to_string()
}

fn default_signed_url_ttl() -> u64 {
    3600
}

/// Fresh per config; `init` persists it so signed URLs survive restarts
fn default_signing_secret() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            root_dir: default_storage_dir(),
            base_url: None,
            signed_url_ttl_secs: default_signed_url_ttl(),
            signing_secret: default_signing_secret(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            assets: AssetsConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: config_path,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("assets.bucket must not be empty".to_string()));
        }
        if self.assets.signing_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "assets.signingSecret must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_data_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.data_dir)
    }

    pub fn get_storage_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.assets.root_dir)
    }

    pub fn listen_addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Public URL prefix for uploaded assets
    pub fn base_url(&self) -> String {
        self.assets
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}
