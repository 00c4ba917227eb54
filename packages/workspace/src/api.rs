//! JSON bodies exchanged over `/api/pages` and `/api/assets`

use pagecraft_editor::{DocumentId, StoredDocument};
use pagecraft_model::Website;
use serde::{Deserialize, Serialize};

/// Query string for `GET /api/pages`
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub id: Option<DocumentId>,
}

/// Body of `POST /api/pages`, `PUT /api/pages` and `POST /api/pages/upsert`.
///
/// Every field is optional on the wire so that a missing one can be
/// reported as a 400 with a JSON error body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    pub page_id: Option<DocumentId>,

    #[serde(default)]
    pub store_data: Option<Website>,

    /// Client-side document version; absent means "latest"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// Every pages endpoint answers with this shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub data: Option<Website>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl DocumentResponse {
    pub fn empty() -> Self {
        Self {
            data: None,
            id: None,
            version: None,
        }
    }
}

impl From<StoredDocument> for DocumentResponse {
    fn from(stored: StoredDocument) -> Self {
        Self {
            data: Some(stored.data),
            id: Some(stored.id),
            version: Some(stored.version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Query string for `POST /api/assets`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadQuery {
    pub name: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub path: String,
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignQuery {
    #[serde(rename = "expiresIn")]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub signed_url: String,
    pub expires: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_request_tolerates_missing_fields() {
        let req: SaveRequest = serde_json::from_str(r#"{"pageId": null}"#).unwrap();
        assert_eq!(req.page_id, None);
        assert!(req.store_data.is_none());
        assert_eq!(req.version, None);
    }

    #[test]
    fn test_empty_response_serializes_null_data() {
        let json = serde_json::to_value(DocumentResponse::empty()).unwrap();
        assert_eq!(json, serde_json::json!({ "data": null }));
    }
}
