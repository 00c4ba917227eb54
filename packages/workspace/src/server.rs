//! # Pages API
//!
//! REST surface over a [`RemoteGateway`] and an [`AssetStore`]:
//!
//! ```text
//! GET    /api/pages?id=N            → { data }            (data: null when absent)
//! POST   /api/pages                 { storeData }         → { data, id }
//! PUT    /api/pages                 { pageId, storeData } → { data, id } | 404
//! POST   /api/pages/upsert          { pageId?, storeData } → { data, id }
//! POST   /api/assets?name=&path=    raw bytes             → { path, publicUrl }
//! DELETE /api/assets/object/*path
//! GET    /api/assets/sign/*path     ?expiresIn=           → { signedUrl, expires }
//! GET    /api/assets/signed/*path   ?expires=&token=      → file bytes
//! GET    /storage/<bucket>/<path>                          → static file
//! ```

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Duration;
use pagecraft_editor::{DocumentId, GatewayError, RemoteGateway};
use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, error, info};

use crate::api::{
    DocumentResponse, ErrorBody, PageQuery, SaveRequest, SignQuery, SignedUrlResponse,
    UploadQuery, UploadResponse,
};
use crate::assets::{AssetError, AssetStore};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("Server error: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Gateway(GatewayError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Asset(AssetError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Asset(AssetError::InvalidPath(_) | AssetError::InvalidExpiry) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Asset(AssetError::AlreadyExists(_)) => StatusCode::CONFLICT,
            ServerError::Asset(AssetError::Expired | AssetError::InvalidSignature) => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected ({}): {}", status, self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, ServerError>;

/// Shared by every handler
#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<dyn RemoteGateway>,
    pub assets: Arc<dyn AssetStore>,

    /// Served under `/storage` when set
    pub storage_dir: Option<PathBuf>,

    /// Lifetime of signed URLs when the caller does not ask for one
    pub signed_url_ttl: Duration,
}

impl ApiState {
    pub fn new(gateway: Arc<dyn RemoteGateway>, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            gateway,
            assets,
            storage_dir: None,
            signed_url_ttl: Duration::seconds(3600),
        }
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }
}

pub fn router(state: ApiState) -> Router {
    let storage_dir = state.storage_dir.clone();

    let app = Router::new()
        .route(
            "/api/pages",
            get(get_page_handler)
                .post(create_page_handler)
                .put(update_page_handler),
        )
        .route("/api/pages/upsert", post(upsert_page_handler))
        .route(
            "/api/assets",
            post(upload_asset_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/assets/object/*path", delete(delete_asset_handler))
        .route("/api/assets/sign/*path", get(sign_asset_handler))
        .route("/api/assets/signed/*path", get(signed_asset_handler))
        .with_state(state);

    let app = match storage_dir {
        Some(dir) => app.nest_service("/storage", ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until the process stops
pub async fn serve(addr: &str, state: ApiState) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("Pages API listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============================================================================
// Pages
// ============================================================================

async fn get_page_handler(
    State(state): State<ApiState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<DocumentResponse>> {
    let id = query
        .id
        .ok_or_else(|| ServerError::BadRequest("Missing id".to_string()))?;

    match state.gateway.get(id).await {
        Ok(stored) => Ok(Json(stored.into())),
        Err(GatewayError::NotFound(_)) => {
            debug!("No website under id {}", id);
            Ok(Json(DocumentResponse::empty()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn create_page_handler(
    State(state): State<ApiState>,
    Json(request): Json<SaveRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    let website = request
        .store_data
        .ok_or_else(|| ServerError::BadRequest("Missing storeData".to_string()))?;

    let stored = state
        .gateway
        .insert(&website, request.version.unwrap_or_default())
        .await?;
    Ok(Json(stored.into()))
}

async fn update_page_handler(
    State(state): State<ApiState>,
    Json(request): Json<SaveRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    let (Some(id), Some(website)) = (request.page_id, request.store_data) else {
        return Err(ServerError::BadRequest(
            "Missing pageId or storeData".to_string(),
        ));
    };

    let version = resolve_version(state.gateway.as_ref(), Some(id), request.version).await?;
    let stored = state.gateway.update(id, &website, version).await?;
    Ok(Json(stored.into()))
}

async fn upsert_page_handler(
    State(state): State<ApiState>,
    Json(request): Json<SaveRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    let website = request
        .store_data
        .ok_or_else(|| ServerError::BadRequest("Missing storeData".to_string()))?;

    let version =
        resolve_version(state.gateway.as_ref(), request.page_id, request.version).await?;
    let stored = state
        .gateway
        .upsert(request.page_id, &website, version)
        .await?;
    Ok(Json(stored.into()))
}

/// Unversioned writes land on top of whatever is stored
async fn resolve_version(
    gateway: &dyn RemoteGateway,
    id: Option<DocumentId>,
    requested: Option<u64>,
) -> ApiResult<u64> {
    if let Some(version) = requested {
        return Ok(version);
    }
    let Some(id) = id else {
        return Ok(0);
    };
    match gateway.get(id).await {
        Ok(stored) => Ok(stored.version),
        Err(GatewayError::NotFound(_)) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Assets
// ============================================================================

async fn upload_asset_handler(
    State(state): State<ApiState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let name = query
        .name
        .ok_or_else(|| ServerError::BadRequest("Missing name".to_string()))?;
    if body.is_empty() {
        return Err(ServerError::BadRequest("Empty upload".to_string()));
    }

    let uploaded = state
        .assets
        .upload(&name, &body, query.path.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            path: uploaded.path,
            public_url: uploaded.public_url,
        }),
    ))
}

async fn delete_asset_handler(
    State(state): State<ApiState>,
    Path(path): Path<String>,
) -> ApiResult<StatusCode> {
    state.assets.delete(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sign_asset_handler(
    State(state): State<ApiState>,
    Path(path): Path<String>,
    Query(query): Query<SignQuery>,
) -> ApiResult<Json<SignedUrlResponse>> {
    let ttl = match query.expires_in {
        Some(secs) => i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or(AssetError::InvalidExpiry)?,
        None => state.signed_url_ttl,
    };

    let signed = state.assets.signed_url(&path, ttl)?;
    Ok(Json(SignedUrlResponse {
        signed_url: signed.url,
        expires: signed.expires,
    }))
}

#[derive(Debug, Deserialize)]
struct SignedFetchQuery {
    expires: Option<i64>,
    token: Option<String>,
}

async fn signed_asset_handler(
    State(state): State<ApiState>,
    Path(path): Path<String>,
    Query(query): Query<SignedFetchQuery>,
) -> ApiResult<Response> {
    let (Some(expires), Some(token)) = (query.expires, query.token) else {
        return Err(ServerError::BadRequest("Missing expires or token".to_string()));
    };

    state.assets.verify_signature(&path, expires, &token)?;
    let bytes = state.assets.read(&path).await?;

    Ok((
        [(header::CONTENT_TYPE, content_type_for(&path))],
        bytes,
    )
        .into_response())
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}
