//! Tests for StateManager and the storage backends

use super::*;
use crate::types::Listing;
use std::sync::Arc;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Bootstrap Tests
// ============================================================================

#[tokio::test]
async fn test_load_bootstraps_and_persists_default() {
    let store = Arc::new(MemoryStore::new());
    let manager = StateManager::from_store(store.clone());

    assert!(store.contents().await.is_none());

    let state = manager.load().await.unwrap();
    assert!(state.checkpoints.is_empty());

    // The default blob is written immediately
    let raw = store.contents().await.unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted["checkpoints"], serde_json::json!({}));
    assert_eq!(persisted["subscribers"], serde_json::json!([]));
}

#[tokio::test]
async fn test_bootstrap_with_token_subscribers() {
    let store = Arc::new(MemoryStore::new());
    let manager =
        StateManager::from_store(store.clone()).with_bootstrap(State::with_token_subscribers());

    let state = manager.load().await.unwrap();
    assert!(state.subscribers.has_tokens());

    let persisted: serde_json::Value =
        serde_json::from_str(&store.contents().await.unwrap()).unwrap();
    assert_eq!(persisted["subscribers"], serde_json::json!({}));
}

#[tokio::test]
async fn test_concurrent_first_loads_share_baseline() {
    let manager = StateManager::in_memory();

    let (a, b) = tokio::join!(manager.load(), manager.load());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.checkpoints.is_empty());
    assert!(b.checkpoints.is_empty());
}

#[tokio::test]
async fn test_load_existing_blob_does_not_overwrite() {
    let store = Arc::new(MemoryStore::with_contents(
        r#"{"checkpoints":{"src":{"company":"Acme","role":"Engineer","location":"NYC"}}}"#,
    ));
    let manager = StateManager::from_store(store.clone());

    let state = manager.load().await.unwrap();
    assert!(state.checkpoint("src").is_some());
    assert!(store.contents().await.unwrap().contains("Acme"));
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::file(&path);
    let mut state = manager.load().await.unwrap();
    state.set_checkpoint("us_internships", Listing::new("Globex", "Dev", "LA"));
    manager.save(&state).await.unwrap();

    let manager2 = StateManager::file(&path);
    let loaded = manager2.load().await.unwrap();

    assert_eq!(
        loaded.checkpoint("us_internships"),
        Some(&Listing::new("Globex", "Dev", "LA"))
    );
    assert!(loaded.updated_at.is_some());
}

#[tokio::test]
async fn test_file_save_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::file(&path);
    manager.save(&State::new()).await.unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_file_store_creates_parent_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let manager = StateManager::file(&path);
    manager.load().await.unwrap();

    assert!(path.exists());
}

#[tokio::test]
async fn test_load_invalid_json_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("invalid.json");

    tokio::fs::write(&path, "{ invalid json }").await.unwrap();

    let manager = StateManager::file(&path);
    let state = manager.load().await.unwrap();

    assert!(state.checkpoints.is_empty());
    assert!(state.subscribers.is_empty());
}

// ============================================================================
// Update Tests
// ============================================================================

#[tokio::test]
async fn test_update_persists_mutation() {
    let manager = StateManager::in_memory();

    let previous = manager
        .update(|state| {
            let previous = state.checkpoint("src").cloned();
            state.set_checkpoint("src", Listing::new("A", "B", "C"));
            Ok(previous)
        })
        .await
        .unwrap();

    assert!(previous.is_none());
    assert!(manager.load().await.unwrap().checkpoint("src").is_some());
}

#[tokio::test]
async fn test_update_error_writes_nothing() {
    let store = Arc::new(MemoryStore::with_contents("{}"));
    let manager = StateManager::from_store(store.clone());

    let result: crate::Result<()> = manager
        .update(|state| {
            state.set_checkpoint("src", Listing::new("A", "B", "C"));
            Err(crate::Error::validation("nope"))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(store.contents().await.as_deref(), Some("{}"));
}

#[tokio::test]
async fn test_concurrent_updates_do_not_lose_writes() {
    let manager = StateManager::in_memory();

    let mut handles = Vec::new();
    for i in 0..20 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .update(move |state| {
                    state.set_checkpoint(&format!("src{i}"), Listing::new("A", "B", "C"));
                    Ok(())
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(manager.load().await.unwrap().checkpoints.len(), 20);
}

#[tokio::test]
async fn test_clone_shares_store() {
    let manager = StateManager::in_memory();
    let cloned = manager.clone();

    manager
        .update(|state| {
            state.set_checkpoint("shared", Listing::new("A", "B", "C"));
            Ok(())
        })
        .await
        .unwrap();

    assert!(cloned.load().await.unwrap().checkpoint("shared").is_some());
}

// ============================================================================
// JsonBin Tests
// ============================================================================

#[tokio::test]
async fn test_jsonbin_read() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b/bin123/latest"))
        .and(header("X-Master-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "checkpoints": {
                "us_internships": {"company": "Acme", "role": "Engineer", "location": "NYC"}
            },
            "subscribers": ["a@example.com"]
        })))
        .mount(&mock_server)
        .await;

    let store = JsonBinStore::with_base_url(mock_server.uri(), "bin123", "secret").unwrap();
    let manager = StateManager::new(store);
    let state = manager.load().await.unwrap();

    assert!(state.checkpoint("us_internships").is_some());
    assert!(state.subscribers.contains("a@example.com"));
}

#[tokio::test]
async fn test_jsonbin_write() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/b/bin123"))
        .and(header("X-Master-Key", "secret"))
        .and(body_partial_json(serde_json::json!({
            "checkpoints": {
                "src": {"company": "A", "role": "B", "location": "C"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = JsonBinStore::with_base_url(mock_server.uri(), "bin123", "secret").unwrap();
    let mut state = State::new();
    state.set_checkpoint("src", Listing::new("A", "B", "C"));

    StateManager::new(store).save(&state).await.unwrap();
}

#[tokio::test]
async fn test_jsonbin_missing_bin_bootstraps() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b/bin123/latest"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/b/bin123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = JsonBinStore::with_base_url(mock_server.uri(), "bin123", "secret").unwrap();
    let state = StateManager::new(store).load().await.unwrap();

    assert!(state.checkpoints.is_empty());
}

#[tokio::test]
async fn test_jsonbin_auth_failure_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b/bin123/latest"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let store = JsonBinStore::with_base_url(mock_server.uri(), "bin123", "wrong").unwrap();
    let result = StateManager::new(store).load().await;

    assert!(matches!(result, Err(crate::Error::State { .. })));
}
