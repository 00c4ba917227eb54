//! # Remote Gateway
//!
//! The persistence boundary: one JSON website document per integer id.
//!
//! Every write carries the local `version` it was issued for. Stores record
//! it alongside the document but apply every write; ordering is the
//! controller's job.

use async_trait::async_trait;
use pagecraft_model::Website;
use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// Remote document identifier
pub type DocumentId = i64;

/// A website as persisted remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub data: Website,

    #[serde(default)]
    pub version: u64,
}

#[async_trait]
pub trait RemoteGateway: Send + Sync + 'static {
    /// Fetch a document; `GatewayError::NotFound` when absent
    async fn get(&self, id: DocumentId) -> Result<StoredDocument, GatewayError>;

    /// Store a new document under a fresh id
    async fn insert(&self, website: &Website, version: u64) -> Result<StoredDocument, GatewayError>;

    /// Replace an existing document; `GatewayError::NotFound` when absent
    async fn update(
        &self,
        id: DocumentId,
        website: &Website,
        version: u64,
    ) -> Result<StoredDocument, GatewayError>;

    /// Update if `id` is given and exists, insert otherwise
    async fn upsert(
        &self,
        id: Option<DocumentId>,
        website: &Website,
        version: u64,
    ) -> Result<StoredDocument, GatewayError> {
        match id {
            Some(id) => match self.update(id, website, version).await {
                Err(GatewayError::NotFound(_)) => {
                    tracing::info!("Document {} missing remotely, inserting", id);
                    self.insert(website, version).await
                }
                other => other,
            },
            None => self.insert(website, version).await,
        }
    }
}
