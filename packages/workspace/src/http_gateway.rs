//! Gateway speaking to a remote `/api/pages` server

use async_trait::async_trait;
use pagecraft_editor::{DocumentId, GatewayError, RemoteGateway, StoredDocument};
use pagecraft_model::Website;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::api::{DocumentResponse, ErrorBody, SaveRequest};

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn pages_url(&self) -> String {
        format!("{}/api/pages", self.base_url)
    }

    async fn save(
        &self,
        request: reqwest::RequestBuilder,
        body: &SaveRequest,
        requested_id: Option<DocumentId>,
    ) -> Result<StoredDocument, GatewayError> {
        let response = request.json(body).send().await.map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            if let Some(id) = requested_id {
                return Err(GatewayError::NotFound(id));
            }
        }

        let body: DocumentResponse = decode(response).await?;
        into_stored(body, requested_id)
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn get(&self, id: DocumentId) -> Result<StoredDocument, GatewayError> {
        debug!("GET {}?id={}", self.pages_url(), id);
        let response = self
            .client
            .get(self.pages_url())
            .query(&[("id", id)])
            .send()
            .await
            .map_err(transport)?;

        let body: DocumentResponse = decode(response).await?;
        let version = body.version.unwrap_or_default();
        match body.data {
            Some(data) => Ok(StoredDocument { id, data, version }),
            None => Err(GatewayError::NotFound(id)),
        }
    }

    async fn insert(&self, website: &Website, version: u64) -> Result<StoredDocument, GatewayError> {
        let body = SaveRequest {
            page_id: None,
            store_data: Some(website.clone()),
            version: Some(version),
        };
        self.save(self.client.post(self.pages_url()), &body, None).await
    }

    async fn update(
        &self,
        id: DocumentId,
        website: &Website,
        version: u64,
    ) -> Result<StoredDocument, GatewayError> {
        let body = SaveRequest {
            page_id: Some(id),
            store_data: Some(website.clone()),
            version: Some(version),
        };
        self.save(self.client.put(self.pages_url()), &body, Some(id)).await
    }

    /// One round trip: the server falls back to insert itself
    async fn upsert(
        &self,
        id: Option<DocumentId>,
        website: &Website,
        version: u64,
    ) -> Result<StoredDocument, GatewayError> {
        let body = SaveRequest {
            page_id: id,
            store_data: Some(website.clone()),
            version: Some(version),
        };
        let url = format!("{}/upsert", self.pages_url());
        self.save(self.client.post(url), &body, None).await
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Parse a success body, or turn an error status into `GatewayError::Server`
async fn decode(response: Response) -> Result<DocumentResponse, GatewayError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport)?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        return Err(GatewayError::Server {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}

fn into_stored(
    body: DocumentResponse,
    requested_id: Option<DocumentId>,
) -> Result<StoredDocument, GatewayError> {
    let id = body.id.or(requested_id).ok_or_else(|| GatewayError::Server {
        status: 200,
        message: "response carried no document id".to_string(),
    })?;
    let data = body.data.ok_or_else(|| GatewayError::Server {
        status: 200,
        message: "response carried no document".to_string(),
    })?;

    Ok(StoredDocument {
        id,
        data,
        version: body.version.unwrap_or_default(),
    })
}
