use keyward_sync::{
    HttpBlobStore, RemoteBackup, RemoteBlobStore, SyncConfig, SyncError, UserId, BACKUP_FORMAT_TAG,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer) -> HttpBlobStore {
    HttpBlobStore::new(SyncConfig {
        base_url: server.uri(),
        request_timeout_secs: 5,
    })
}

fn backup() -> RemoteBackup {
    RemoteBackup {
        encrypted_blob: "bm9uY2UrY2lwaGVydGV4dA==".into(),
        format_tag: BACKUP_FORMAT_TAG.into(),
        updated_at: chrono::Utc::now(),
    }
}

// --- Put ---

#[tokio::test]
async fn put_success() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/backups/user-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store = setup(&server);
    store
        .put(&UserId("user-1".into()), &backup())
        .await
        .unwrap();
}

#[tokio::test]
async fn put_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/backups/user-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = setup(&server);
    let result = store.put(&UserId("user-1".into()), &backup()).await;
    assert!(matches!(
        result.unwrap_err(),
        SyncError::RemoteUnavailable(_)
    ));
}

// --- Get ---

#[tokio::test]
async fn get_roundtrip() {
    let server = MockServer::start().await;
    let stored = backup();
    Mock::given(method("GET"))
        .and(path("/backups/user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
        .mount(&server)
        .await;

    let store = setup(&server);
    let fetched = store.get(&UserId("user-1".into())).await.unwrap().unwrap();
    assert_eq!(fetched.encrypted_blob, stored.encrypted_blob);
    assert_eq!(fetched.format_tag, BACKUP_FORMAT_TAG);
}

#[tokio::test]
async fn get_missing_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backups/user-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = setup(&server);
    assert!(store.get(&UserId("user-1".into())).await.unwrap().is_none());
}

#[tokio::test]
async fn get_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backups/user-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = setup(&server);
    let result = store.get(&UserId("user-1".into())).await;
    assert!(matches!(
        result.unwrap_err(),
        SyncError::RemoteUnavailable(_)
    ));
}

#[tokio::test]
async fn get_garbage_body_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backups/user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let store = setup(&server);
    let result = store.get(&UserId("user-1".into())).await;
    assert!(matches!(
        result.unwrap_err(),
        SyncError::RemoteUnavailable(_)
    ));
}

// --- Path encoding ---

#[tokio::test]
async fn user_ids_are_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/backups/user%40example.com"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store = setup(&server);
    store
        .put(&UserId("user@example.com".into()), &backup())
        .await
        .unwrap();
}
