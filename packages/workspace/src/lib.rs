//! Persistence and asset collaborators for the site editor: a file-backed
//! document store, an HTTP client for the pages API, a local image bucket,
//! and the REST server tying them together.

pub mod api;
pub mod assets;
pub mod http_gateway;
pub mod server;
pub mod store;

pub use api::{DocumentResponse, ErrorBody, SaveRequest, SignedUrlResponse, UploadResponse};
pub use assets::{AssetError, AssetStore, LocalAssetStore, SignedUrl, Uploaded};
pub use http_gateway::HttpGateway;
pub use server::{router, serve, ApiState, ServerError};
pub use store::FileGateway;
