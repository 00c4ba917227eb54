//! File-backed document store: one `<id>.json` per website in a data directory

use async_trait::async_trait;
use pagecraft_editor::{DocumentId, GatewayError, RemoteGateway, StoredDocument};
use pagecraft_model::Website;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct FileGateway {
    data_dir: PathBuf,

    /// Serializes id allocation and existence checks
    write_lock: Mutex<()>,
}

impl FileGateway {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn document_path(&self, id: DocumentId) -> PathBuf {
        self.data_dir.join(format!("{}.json", id))
    }

    /// Ids of every stored document, ascending
    pub async fn list_ids(&self) -> Result<Vec<DocumentId>, GatewayError> {
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<DocumentId>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    async fn read(&self, id: DocumentId) -> Result<StoredDocument, GatewayError> {
        let bytes = match tokio::fs::read(self.document_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(GatewayError::NotFound(id))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write through a temp file so readers never see a partial document
    async fn write(&self, doc: &StoredDocument) -> Result<(), GatewayError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let path = self.document_path(doc.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for FileGateway {
    async fn get(&self, id: DocumentId) -> Result<StoredDocument, GatewayError> {
        debug!("Reading website {} from {:?}", id, self.data_dir);
        self.read(id).await
    }

    async fn insert(&self, website: &Website, version: u64) -> Result<StoredDocument, GatewayError> {
        let _guard = self.write_lock.lock().await;

        let id = self.list_ids().await?.last().map(|id| id + 1).unwrap_or(1);
        let doc = StoredDocument {
            id,
            data: website.clone(),
            version,
        };
        self.write(&doc).await?;

        info!("Created website {} at version {}", id, version);
        Ok(doc)
    }

    async fn update(
        &self,
        id: DocumentId,
        website: &Website,
        version: u64,
    ) -> Result<StoredDocument, GatewayError> {
        let _guard = self.write_lock.lock().await;

        if !tokio::fs::try_exists(self.document_path(id)).await? {
            return Err(GatewayError::NotFound(id));
        }

        let doc = StoredDocument {
            id,
            data: website.clone(),
            version,
        };
        self.write(&doc).await?;

        debug!("Updated website {} to version {}", id, version);
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::Page;
    use tempfile::TempDir;

    fn website(name: &str) -> Website {
        let mut website = Website::bootstrap();
        website.name = name.to_string();
        website
    }

    #[tokio::test]
    async fn test_get_from_missing_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(dir.path().join("nope"));

        assert!(gateway.get(1).await.unwrap_err().is_not_found());
        assert!(gateway.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_allocates_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(dir.path());

        let first = gateway.insert(&website("One"), 0).await.unwrap();
        let second = gateway.insert(&website("Two"), 0).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(gateway.list_ids().await.unwrap(), vec![1, 2]);
        assert!(dir.path().join("2.json").exists());
    }

    #[tokio::test]
    async fn test_update_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(dir.path());
        let created = gateway.insert(&website("Draft"), 1).await.unwrap();

        let mut edited = website("Published");
        edited.pages.push(Page::new("page_1", "About Us"));
        gateway.update(created.id, &edited, 2).await.unwrap();

        // A fresh gateway over the same directory sees the write
        let reopened = FileGateway::new(dir.path());
        let stored = reopened.get(created.id).await.unwrap();
        assert_eq!(stored.data, edited);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_update_applies_lower_version() {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(dir.path());
        let created = gateway.insert(&website("Imported"), 10).await.unwrap();

        let returned = gateway.update(created.id, &website("Edited"), 1).await.unwrap();

        assert_eq!(returned.data.name, "Edited");
        assert_eq!(returned.version, 1);
        let stored = gateway.get(created.id).await.unwrap();
        assert_eq!(stored.data.name, "Edited");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_update_of_missing_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(dir.path());

        let err = gateway.update(9, &website("Ghost"), 1).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(gateway.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_of_missing_id_inserts() {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(dir.path());

        let stored = gateway.upsert(Some(40), &website("Fresh"), 1).await.unwrap();

        assert_eq!(stored.id, 1);
        assert!(gateway.get(40).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("draft.json"), "{}").unwrap();
        let gateway = FileGateway::new(dir.path());

        assert!(gateway.list_ids().await.unwrap().is_empty());
        assert_eq!(gateway.insert(&website("One"), 0).await.unwrap().id, 1);
    }
}
