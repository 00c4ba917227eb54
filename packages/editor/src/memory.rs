//! In-process document store, for tests and offline editing

use async_trait::async_trait;
use pagecraft_model::Website;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{DocumentId, GatewayError, RemoteGateway, StoredDocument};

#[derive(Debug, Default)]
pub struct MemoryGateway {
    records: Mutex<BTreeMap<DocumentId, StoredDocument>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one document
    pub fn with_document(id: DocumentId, website: Website) -> Self {
        let gateway = Self::new();
        gateway.seed(id, website);
        gateway
    }

    /// Store `website` under `id` at version 0, bypassing counters
    pub fn seed(&self, id: DocumentId, website: Website) {
        self.records.lock().insert(
            id,
            StoredDocument {
                id,
                data: website,
                version: 0,
            },
        );
    }

    /// Make every subsequent read fail with a transport error
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with a transport error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `get` calls so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of insert/update calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.read_count() + self.write_count()
    }

    /// Current stored copy, bypassing counters
    pub fn stored(&self, id: DocumentId) -> Option<StoredDocument> {
        self.records.lock().get(&id).cloned()
    }

    fn check_write(&self) -> Result<(), GatewayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn get(&self, id: DocumentId) -> Result<StoredDocument, GatewayError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("read rejected".to_string()));
        }

        self.records
            .lock()
            .get(&id)
            .cloned()
            .ok_or(GatewayError::NotFound(id))
    }

    async fn insert(&self, website: &Website, version: u64) -> Result<StoredDocument, GatewayError> {
        self.check_write()?;

        let mut records = self.records.lock();
        let id = records.keys().next_back().map(|id| id + 1).unwrap_or(1);
        let doc = StoredDocument {
            id,
            data: website.clone(),
            version,
        };
        records.insert(id, doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        id: DocumentId,
        website: &Website,
        version: u64,
    ) -> Result<StoredDocument, GatewayError> {
        self.check_write()?;

        let mut records = self.records.lock();
        let existing = records.get_mut(&id).ok_or(GatewayError::NotFound(id))?;
        existing.data = website.clone();
        existing.version = version;
        Ok(existing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let gateway = MemoryGateway::new();
        let err = gateway.get(42).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(gateway.read_count(), 1);
    }

    #[tokio::test]
    async fn test_upsert_falls_back_to_insert() {
        let gateway = MemoryGateway::new();
        let stored = gateway
            .upsert(Some(7), &Website::bootstrap(), 1)
            .await
            .unwrap();

        assert_eq!(stored.id, 1);
        assert!(gateway.stored(1).is_some());
        // update attempt + insert
        assert_eq!(gateway.write_count(), 2);
    }

    #[tokio::test]
    async fn test_update_stores_whatever_it_is_sent() {
        let mut seeded = Website::bootstrap();
        seeded.name = "Remote".to_string();
        let gateway = MemoryGateway::new();
        gateway.seed(3, seeded);
        gateway.update(3, &Website::bootstrap(), 10).await.unwrap();

        let mut edited = Website::bootstrap();
        edited.name = "Edited".to_string();
        let returned = gateway.update(3, &edited, 1).await.unwrap();

        assert_eq!(returned.version, 1);
        assert_eq!(gateway.stored(3).unwrap().data.name, "Edited");
    }

    #[tokio::test]
    async fn test_failed_writes_are_counted() {
        let gateway = MemoryGateway::new();
        gateway.fail_writes(true);

        assert!(gateway.insert(&Website::bootstrap(), 0).await.is_err());
        assert_eq!(gateway.write_count(), 1);
        assert!(gateway.stored(1).is_none());
    }
}
