//! Error types for the remote boundary

use thiserror::Error;

use crate::gateway::DocumentId;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No website stored under id {0}")]
    NotFound(DocumentId),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}
