//! Craft dataset provider: fresh fetch, cache write, cache fallback.
mod common;

use common::{dead_base_url, test_config, MockResponse, MockServer, SAMPLE_CRAFTS};
use ntmbot::storage::CRAFT_DATA_FILE;
use ntmbot::townstar::{CraftDataProvider, CraftDataSource};

#[tokio::test]
async fn test_fresh_fetch_writes_cache() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start(|_| MockResponse::json(200, SAMPLE_CRAFTS)).await;
    let config = test_config(dir.path(), &server.base_url);

    let provider = CraftDataProvider::new(&config.townstar, &config.storage.data_dir);
    let loaded = provider.load().await.unwrap();
    assert_eq!(loaded.source, CraftDataSource::Fresh);
    assert!(loaded.dataset.contains("Blue_Steel"));

    let cached = std::fs::read_to_string(dir.path().join(CRAFT_DATA_FILE)).unwrap();
    assert_eq!(cached, SAMPLE_CRAFTS);
    assert_eq!(server.requests_to("/crafts.json").len(), 1);

    // every load fetches again
    provider.load().await.unwrap();
    assert_eq!(server.requests_to("/crafts.json").len(), 2);
}

#[tokio::test]
async fn test_falls_back_to_cache_when_offline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CRAFT_DATA_FILE), SAMPLE_CRAFTS).unwrap();
    let config = test_config(dir.path(), &dead_base_url());

    let provider = CraftDataProvider::new(&config.townstar, &config.storage.data_dir);
    let loaded = provider.load().await.unwrap();
    assert_eq!(loaded.source, CraftDataSource::Cached);
    assert_eq!(loaded.dataset.len(), 5);
}

#[tokio::test]
async fn test_malformed_download_keeps_previous_cache() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CRAFT_DATA_FILE), SAMPLE_CRAFTS).unwrap();
    let server = MockServer::start(|_| MockResponse::json(200, "{\"Wood\": ")).await;
    let config = test_config(dir.path(), &server.base_url);

    let provider = CraftDataProvider::new(&config.townstar, &config.storage.data_dir);
    let loaded = provider.load().await.unwrap();
    assert_eq!(loaded.source, CraftDataSource::Cached);
    let cached = std::fs::read_to_string(dir.path().join(CRAFT_DATA_FILE)).unwrap();
    assert_eq!(cached, SAMPLE_CRAFTS);
}

#[tokio::test]
async fn test_unavailable_without_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &dead_base_url());
    let provider = CraftDataProvider::new(&config.townstar, &config.storage.data_dir);
    let err = provider.load().await.unwrap_err();
    assert!(err.to_string().contains("craft data unavailable"));
}
