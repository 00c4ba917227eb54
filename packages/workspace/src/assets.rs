//! # Asset Store
//!
//! Image bucket behind gallery, video and split-view media. Files live under
//! `<root>/<bucket>/` and are served from `<base_url>/storage/<bucket>/`.
//! Signed URLs point at `<base_url>/api/assets/signed/<path>` and carry an
//! expiry plus an HMAC-SHA256 token keyed by the signing secret over the
//! object path and the expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Invalid asset path: {0}")]
    InvalidPath(String),

    #[error("Asset already exists: {0}")]
    AlreadyExists(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Expiry out of range")]
    InvalidExpiry,

    #[error("Signed URL expired")]
    Expired,

    #[error("Signature does not match")]
    InvalidSignature,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Where an upload landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    /// Object path inside the bucket
    pub path: String,
    pub public_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    /// Unix seconds
    pub expires: i64,
}

#[async_trait]
pub trait AssetStore: Send + Sync + 'static {
    fn bucket(&self) -> &str;

    /// Store `bytes` under `path`, or `<unix-millis>_<name>` when no path is
    /// given. Existing objects are never overwritten.
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        path: Option<&str>,
    ) -> Result<Uploaded, AssetError>;

    async fn upload_many(&self, files: &[(String, Vec<u8>)]) -> Result<Vec<Uploaded>, AssetError> {
        futures::future::try_join_all(
            files
                .iter()
                .map(|(name, bytes)| self.upload(name, bytes, None)),
        )
        .await
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    async fn delete(&self, path: &str) -> Result<(), AssetError>;

    fn public_url(&self, path: &str) -> String;

    fn signed_url(&self, path: &str, ttl: Duration) -> Result<SignedUrl, AssetError>;

    fn verify_signature(&self, path: &str, expires: i64, token: &str) -> Result<(), AssetError>;
}

pub struct LocalAssetStore {
    root_dir: PathBuf,
    bucket: String,
    base_url: String,
    signing_secret: String,
}

impl LocalAssetStore {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        bucket: impl Into<String>,
        base_url: impl Into<String>,
        signing_secret: impl Into<String>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            bucket: bucket.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signing_secret: signing_secret.into(),
        }
    }

    /// Directory holding the bucket's files
    pub fn bucket_dir(&self) -> PathBuf {
        self.root_dir.join(&self.bucket)
    }

    /// Directory served under `/storage`
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn object_path(&self, path: &str) -> Result<PathBuf, AssetError> {
        validate_path(path)?;
        Ok(self.bucket_dir().join(path))
    }

    fn mac(&self, path: &str, expires: i64) -> Result<HmacSha256, AssetError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|_| AssetError::InvalidSignature)?;
        mac.update(self.bucket.as_bytes());
        mac.update(b"/");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    pub fn signed_url_at(
        &self,
        path: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<SignedUrl, AssetError> {
        validate_path(path)?;
        let expires = now
            .checked_add_signed(ttl)
            .ok_or(AssetError::InvalidExpiry)?
            .timestamp();
        let url = format!(
            "{}/api/assets/signed/{}?expires={}&token={}",
            self.base_url,
            path,
            expires,
            hex::encode(self.mac(path, expires)?.finalize().into_bytes())
        );
        Ok(SignedUrl { url, expires })
    }

    pub fn verify_signature_at(
        &self,
        path: &str,
        expires: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AssetError> {
        validate_path(path)?;
        let token = hex::decode(token).map_err(|_| AssetError::InvalidSignature)?;
        self.mac(path, expires)?
            .verify_slice(&token)
            .map_err(|_| AssetError::InvalidSignature)?;
        if now.timestamp() > expires {
            return Err(AssetError::Expired);
        }
        Ok(())
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        path: Option<&str>,
    ) -> Result<Uploaded, AssetError> {
        let path = match path {
            Some(path) => path.to_string(),
            None => format!("{}_{}", Utc::now().timestamp_millis(), sanitize_name(name)),
        };
        let target = self.object_path(&path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(AssetError::AlreadyExists(path))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes).await?;
        file.flush().await?;

        info!("Uploaded {} ({} bytes) to bucket {}", path, bytes.len(), self.bucket);
        Ok(Uploaded {
            public_url: self.public_url(&path),
            path,
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let target = self.object_path(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), AssetError> {
        let target = self.object_path(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!("Deleted {} from bucket {}", path, self.bucket);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/{}/{}", self.base_url, self.bucket, path)
    }

    fn signed_url(&self, path: &str, ttl: Duration) -> Result<SignedUrl, AssetError> {
        self.signed_url_at(path, ttl, Utc::now())
    }

    fn verify_signature(&self, path: &str, expires: i64, token: &str) -> Result<(), AssetError> {
        self.verify_signature_at(path, expires, token, Utc::now())
    }
}

/// Relative, no parent hops, nothing empty
fn validate_path(path: &str) -> Result<(), AssetError> {
    if path.is_empty() {
        return Err(AssetError::InvalidPath(path.to_string()));
    }
    let all_normal = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !all_normal {
        return Err(AssetError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Keep file names URL-safe
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
