use crate::Timestamp;

/// Id of the built-in first page. Never regenerated.
pub const HOME_PAGE_ID: &str = "home";

/// Fresh opaque block id
pub fn new_block_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fresh id for a gallery image
pub fn new_image_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Page ids are derived from their creation time: `page_<unix-millis>`
pub fn page_id_for(created_at: Timestamp) -> String {
    format!("page_{}", created_at.timestamp_millis())
}
