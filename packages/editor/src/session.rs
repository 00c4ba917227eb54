//! # Site Store
//!
//! Owns the authoritative in-memory website and keeps a remote copy in step
//! with optimistic writes.
//!
//! Every mutation:
//! 1. computes the next document with [`Mutation::apply`]
//! 2. swaps it into local state immediately
//! 3. if a remote id is known, spawns an upsert of the whole document
//!    tagged with the new local version, without waiting for it
//! 4. on failure, logs and moves on: no rollback, no retry, no UI error
//!
//! Writes reach the gateway one at a time in version order, and a write
//! older than one already stored is skipped, so the remote never moves
//! backwards. Acknowledgements for versions older than the latest local one
//! are ignored, and a fetch only lands if no newer fetch was started after it.

use chrono::Utc;
use pagecraft_model::{Block, Page, Website, HOME_PAGE_ID};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    BlockPatch, DocumentId, GatewayError, Mutation, MutationOutcome, NewPage, PageUpdate,
    RemoteGateway, StoredDocument,
};

/// Snapshot of everything the UI renders from
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub website: Website,

    /// Page shown in the editor
    pub current_page_id: String,

    /// Remote document id; `None` keeps all edits local
    pub database_id: Option<DocumentId>,

    /// True while a fetch is in flight
    pub is_loading: bool,

    /// Last fetch failure, user-visible
    pub error: Option<String>,

    /// Bumped on every applied local change
    pub version: u64,

    /// Latest version the remote acknowledged
    pub synced_version: u64,
}

impl StoreState {
    fn new(website: Website) -> Self {
        let current_page_id = resolve_current_page(&website, HOME_PAGE_ID);
        Self {
            website,
            current_page_id,
            database_id: None,
            is_loading: false,
            error: None,
            version: 0,
            synced_version: 0,
        }
    }

    /// Page for `current_page_id`, falling back to the first page
    pub fn current_page(&self) -> Option<&Page> {
        self.website
            .page(&self.current_page_id)
            .or_else(|| self.website.pages.first())
    }

    /// Whether the remote has acknowledged the latest local change
    pub fn is_synced(&self) -> bool {
        self.synced_version == self.version
    }
}

/// How a fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Remote document replaced the local one
    Loaded,
    /// No document under that id; `error` is set
    NotFound,
    /// Transport or server failure; `error` is set
    Failed,
    /// A newer fetch was started; this result was dropped
    Superseded,
}

struct Inner {
    state: StoreState,
    fetch_seq: u64,
}

/// Sync controller over a [`RemoteGateway`]
pub struct SiteStore<G: RemoteGateway> {
    gateway: Arc<G>,
    inner: Arc<Mutex<Inner>>,
    writes: Mutex<Vec<JoinHandle<()>>>,

    /// Held for the duration of each upsert; guards the last version written
    write_gate: Arc<tokio::sync::Mutex<u64>>,
}

impl<G: RemoteGateway> SiteStore<G> {
    /// Store bootstrapped with the default home page
    pub fn new(gateway: G) -> Self {
        Self::with_website(gateway, Website::bootstrap())
    }

    pub fn with_website(gateway: G, website: Website) -> Self {
        Self {
            gateway: Arc::new(gateway),
            inner: Arc::new(Mutex::new(Inner {
                state: StoreState::new(website),
                fetch_seq: 0,
            })),
            writes: Mutex::new(Vec::new()),
            write_gate: Arc::new(tokio::sync::Mutex::new(0)),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Consistent copy of the current state
    pub fn snapshot(&self) -> StoreState {
        self.inner.lock().state.clone()
    }

    pub fn website(&self) -> Website {
        self.inner.lock().state.website.clone()
    }

    pub fn current_page(&self) -> Option<Page> {
        self.inner.lock().state.current_page().cloned()
    }

    /// Replace the whole document locally, without a remote write.
    ///
    /// The store is left unsynced: the remote has not seen this document, and
    /// the next applied mutation uploads it.
    pub fn set_website(&self, website: Website) {
        let mut inner = self.inner.lock();
        let state = &mut inner.state;
        state.current_page_id = resolve_current_page(&website, &state.current_page_id);
        state.website = website;
        state.version += 1;
    }

    /// Point the editor at a page. Returns false (and changes nothing) for
    /// an unknown id.
    pub fn set_current_page(&self, page_id: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.website.has_page(page_id) {
            debug!("Ignoring selection of unknown page {}", page_id);
            return false;
        }
        inner.state.current_page_id = page_id.to_string();
        true
    }

    pub fn set_database_id(&self, id: Option<DocumentId>) {
        self.inner.lock().state.database_id = id;
    }

    /// Replace the local website with the remote copy under `remote_id`.
    ///
    /// Failures land in `error`; nothing is returned as `Err`.
    pub async fn fetch_and_update_store(&self, remote_id: DocumentId) -> FetchOutcome {
        let request = {
            let mut inner = self.inner.lock();
            inner.fetch_seq += 1;
            inner.state.is_loading = true;
            inner.state.error = None;
            inner.fetch_seq
        };

        info!("Fetching website {} (request {})", remote_id, request);
        let result = self.gateway.get(remote_id).await;

        let mut inner = self.inner.lock();
        if inner.fetch_seq != request {
            debug!(
                "Dropping fetch {} for website {}: superseded by request {}",
                request, remote_id, inner.fetch_seq
            );
            return FetchOutcome::Superseded;
        }

        let state = &mut inner.state;
        state.is_loading = false;

        match result {
            Ok(stored) => {
                state.current_page_id = resolve_current_page(&stored.data, &state.current_page_id);
                state.website = stored.data;
                state.database_id = Some(remote_id);
                state.version = (state.version + 1).max(stored.version);
                state.synced_version = state.version;
                state.error = None;
                info!("Loaded website {} at version {}", remote_id, state.version);
                FetchOutcome::Loaded
            }
            Err(GatewayError::NotFound(id)) => {
                warn!("Website {} not found", id);
                state.error = Some(format!("No website found for id {}", id));
                FetchOutcome::NotFound
            }
            Err(e) => {
                warn!("Failed to fetch website {}: {}", remote_id, e);
                state.error = Some(e.to_string());
                FetchOutcome::Failed
            }
        }
    }

    /// Remember `remote_id` and fetch it
    pub async fn load(&self, remote_id: DocumentId) -> FetchOutcome {
        self.set_database_id(Some(remote_id));
        self.fetch_and_update_store(remote_id).await
    }

    pub fn add_page(&self, page: NewPage) -> MutationOutcome {
        self.commit(Mutation::AddPage { page })
    }

    pub fn update_page(&self, page_id: &str, update: PageUpdate) -> MutationOutcome {
        self.commit(Mutation::UpdatePage {
            page_id: page_id.to_string(),
            update,
        })
    }

    /// Deleting the current page moves the editor to the home page
    pub fn delete_page(&self, page_id: &str) -> MutationOutcome {
        self.commit(Mutation::DeletePage {
            page_id: page_id.to_string(),
        })
    }

    pub fn add_block(&self, page_id: &str, block: Block) -> MutationOutcome {
        self.commit(Mutation::AddBlock {
            page_id: page_id.to_string(),
            block,
        })
    }

    pub fn update_block(&self, page_id: &str, block_id: &str, patch: BlockPatch) -> MutationOutcome {
        self.commit(Mutation::UpdateBlock {
            page_id: page_id.to_string(),
            block_id: block_id.to_string(),
            patch,
        })
    }

    pub fn delete_block(&self, page_id: &str, block_id: &str) -> MutationOutcome {
        self.commit(Mutation::DeleteBlock {
            page_id: page_id.to_string(),
            block_id: block_id.to_string(),
        })
    }

    pub fn reorder_blocks(&self, page_id: &str, blocks: Vec<Block>) -> MutationOutcome {
        self.commit(Mutation::ReorderBlocks {
            page_id: page_id.to_string(),
            blocks,
        })
    }

    pub fn move_block_up(&self, page_id: &str, block_id: &str) -> MutationOutcome {
        self.commit(Mutation::MoveBlockUp {
            page_id: page_id.to_string(),
            block_id: block_id.to_string(),
        })
    }

    pub fn move_block_down(&self, page_id: &str, block_id: &str) -> MutationOutcome {
        self.commit(Mutation::MoveBlockDown {
            page_id: page_id.to_string(),
            block_id: block_id.to_string(),
        })
    }

    /// Apply a mutation optimistically and schedule its remote write
    pub fn commit(&self, mutation: Mutation) -> MutationOutcome {
        let now = Utc::now();

        let (website, version, database_id) = {
            let mut inner = self.inner.lock();
            let state = &mut inner.state;
            let applied = mutation.apply(&state.website, now);

            if let MutationOutcome::Ignored(reason) = &applied.outcome {
                debug!("{} ignored: {}", mutation.name(), reason);
                return applied.outcome;
            }

            state.website = applied.website;
            state.version += 1;

            if let Mutation::DeletePage { page_id } = &mutation {
                if state.current_page_id == *page_id {
                    state.current_page_id = HOME_PAGE_ID.to_string();
                }
            }

            debug!("{} applied (version {})", mutation.name(), state.version);
            (state.website.clone(), state.version, state.database_id)
        };

        match database_id {
            Some(id) => self.spawn_upsert(id, website, version),
            None => debug!("No database id; {} kept local", mutation.name()),
        }

        MutationOutcome::Applied
    }

    /// Wait for every remote write issued so far
    pub async fn flush(&self) {
        let handles = std::mem::take(&mut *self.writes.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Upsert task did not complete: {}", e);
            }
        }
    }

    /// Remote writes still in flight
    pub fn pending_writes(&self) -> usize {
        self.writes.lock().iter().filter(|h| !h.is_finished()).count()
    }

    fn spawn_upsert(&self, id: DocumentId, website: Website, version: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; skipping upsert of version {}", version);
            return;
        };

        let gateway = Arc::clone(&self.gateway);
        let inner = Arc::clone(&self.inner);
        let gate = Arc::clone(&self.write_gate);

        let handle = runtime.spawn(async move {
            let mut last_written = gate.lock().await;
            if *last_written >= version {
                debug!(
                    "Skipping upsert of version {}: version {} already written",
                    version, *last_written
                );
                return;
            }

            match gateway.upsert(Some(id), &website, version).await {
                Ok(stored) => {
                    *last_written = version;
                    acknowledge(&inner, id, version, stored);
                }
                Err(e) => warn!("Upsert of website {} (version {}) failed: {}", id, version, e),
            }
        });

        let mut writes = self.writes.lock();
        writes.retain(|h| !h.is_finished());
        writes.push(handle);
    }
}

/// Record a completed upsert unless something newer already happened
fn acknowledge(inner: &Mutex<Inner>, sent_id: DocumentId, sent_version: u64, stored: StoredDocument) {
    let mut inner = inner.lock();
    let state = &mut inner.state;

    if state.database_id != Some(sent_id) {
        debug!("Dropping ack for website {}: store now points elsewhere", sent_id);
        return;
    }
    if sent_version < state.version {
        debug!(
            "Dropping stale ack for version {} (local {})",
            sent_version, state.version
        );
        return;
    }

    state.synced_version = state.synced_version.max(sent_version);
    if stored.id != sent_id {
        info!("Website {} was re-created remotely as {}", sent_id, stored.id);
        state.database_id = Some(stored.id);
    }
}

fn resolve_current_page(website: &Website, preferred: &str) -> String {
    if website.has_page(preferred) {
        return preferred.to_string();
    }
    website
        .pages
        .first()
        .map(|p| p.id.clone())
        .unwrap_or_else(|| HOME_PAGE_ID.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryGateway;

    #[test]
    fn test_store_starts_on_home() {
        let store = SiteStore::new(MemoryGateway::new());
        let state = store.snapshot();

        assert_eq!(state.current_page_id, HOME_PAGE_ID);
        assert_eq!(state.database_id, None);
        assert!(!state.is_loading);
        assert!(state.is_synced());
    }

    #[test]
    fn test_mutation_without_database_id_stays_local() {
        let store = SiteStore::new(MemoryGateway::new());

        let outcome = store.add_page(NewPage::named("About Us"));

        assert!(outcome.is_applied());
        assert_eq!(store.website().pages.len(), 2);
        assert_eq!(store.gateway().call_count(), 0);
        assert_eq!(store.pending_writes(), 0);
    }

    #[test]
    fn test_set_current_page_rejects_unknown() {
        let store = SiteStore::new(MemoryGateway::new());
        assert!(!store.set_current_page("nope"));
        assert!(store.set_current_page(HOME_PAGE_ID));
    }

    #[test]
    fn test_set_website_falls_back_to_first_page() {
        let store = SiteStore::new(MemoryGateway::new());
        let mut website = Website::bootstrap();
        website.pages = vec![Page::new("landing", "Landing")];

        store.set_website(website);
        assert_eq!(store.snapshot().current_page_id, "landing");
    }

    #[tokio::test]
    async fn test_set_website_stays_unsynced_until_next_write() {
        let store = SiteStore::new(MemoryGateway::with_document(1, Website::bootstrap()));
        store.set_database_id(Some(1));

        let mut website = Website::bootstrap();
        website.name = "Imported".to_string();
        store.set_website(website);

        assert!(!store.snapshot().is_synced());
        assert_eq!(store.gateway().write_count(), 0);

        store.update_page(HOME_PAGE_ID, PageUpdate::rename("Start"));
        store.flush().await;

        let state = store.snapshot();
        assert!(state.is_synced());
        assert_eq!(store.gateway().stored(1).unwrap().data.name, "Imported");
    }
}
