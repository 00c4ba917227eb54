//! SiteStore driving a live API server through HttpGateway

use pagecraft_editor::{FetchOutcome, MemoryGateway, NewPage, RemoteGateway, SiteStore};
use pagecraft_model::{Block, Website, HOME_PAGE_ID};
use pagecraft_workspace::{router, ApiState, FileGateway, HttpGateway, LocalAssetStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Serve `gateway` on an ephemeral port; returns the base URL
async fn spawn_server(gateway: Arc<dyn RemoteGateway>, storage: &TempDir) -> String {
    let assets = Arc::new(LocalAssetStore::new(
        storage.path(),
        "images",
        "http://localhost",
        "secret",
    ));
    let app = router(ApiState::new(gateway, assets));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let storage = TempDir::new().unwrap();
    let base = spawn_server(Arc::new(MemoryGateway::new()), &storage).await;
    let gateway = HttpGateway::new(base);

    assert!(gateway.get(12).await.unwrap_err().is_not_found());
    assert!(gateway
        .update(12, &Website::bootstrap(), 1)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_insert_then_get_round_trips() {
    let storage = TempDir::new().unwrap();
    let base = spawn_server(Arc::new(MemoryGateway::new()), &storage).await;
    let gateway = HttpGateway::new(format!("{}/", base));

    let mut site = Website::bootstrap();
    site.name = "Studio".to_string();
    let created = gateway.insert(&site, 3).await.unwrap();

    let fetched = gateway.get(created.id).await.unwrap();
    assert_eq!(fetched.data, site);
    assert_eq!(fetched.version, 3);
}

#[tokio::test]
async fn test_store_edits_reach_disk_through_server() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let base = spawn_server(Arc::new(FileGateway::new(data.path())), &storage).await;

    let store = SiteStore::new(HttpGateway::new(base.clone()));
    store.set_database_id(Some(1));
    store.add_page(NewPage::named("About Us"));
    // The first write creates the document; let it land before the next
    store.flush().await;
    store.add_block(HOME_PAGE_ID, Block::text("<p>Welcome</p>", 0, chrono::Utc::now()));
    store.flush().await;

    let state = store.snapshot();
    assert_eq!(state.database_id, Some(1));
    assert!(state.is_synced());

    // A second editor sees the same document
    let reader = SiteStore::new(HttpGateway::new(base));
    assert_eq!(reader.load(1).await, FetchOutcome::Loaded);
    assert_eq!(reader.website(), state.website);
    assert!(data.path().join("1.json").exists());
}

#[tokio::test]
async fn test_unreachable_server_reports_fetch_failure() {
    let store = SiteStore::new(HttpGateway::new("http://127.0.0.1:9"));

    assert_eq!(store.load(1).await, FetchOutcome::Failed);
    assert!(store.snapshot().error.is_some());
}
