//! Integration tests for the AniStream SDK request pipeline

use anistream_sdk::{
    AniStreamClient, AuthFailureSubscription, AuthStatus, ClientBuilder, ErrorCode, FileBackend,
    MemoryNavigator, Navigator, Page, WatchProgressUpdate,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANIME_ID: &str = "6f1c1f9e-3d1b-4c55-9a52-2f7d1c0a8b11";

fn signed_in(server: &MockServer, access: &str, refresh: &str) -> AniStreamClient {
    ClientBuilder::default()
        .base_url(server.uri())
        .with_tokens(access, refresh)
        .build()
        .unwrap()
}

fn count_failures(client: &AniStreamClient) -> (Arc<AtomicUsize>, AuthFailureSubscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let subscription = client.subscribe(move |route| {
        assert_eq!(route, "/");
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (count, subscription)
}

fn favorite_json() -> serde_json::Value {
    json!([{
        "id": "0b7f5d0e-7a0c-4f6e-9d8e-1d2c3b4a5f60",
        "anime_id": ANIME_ID,
        "created_at": "2024-05-01T12:00:00Z"
    }])
}

async fn mount_refresh(server: &MockServer, from: &str, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": from })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": access,
                    "refresh_token": refresh,
                    "token_type": "bearer"
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .and(header("Authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(favorite_json()))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, "r1", "a2", "r2").await;

    let client = signed_in(&mock_server, "a1", "r1");
    let (failures, _subscription) = count_failures(&client);

    let favorites = client.list_favorites().await.unwrap();
    assert_eq!(favorites[0].anime_id.to_string(), ANIME_ID);

    let auth = client.store().auth().unwrap();
    assert_eq!(auth.access_token, "a2");
    assert_eq!(auth.refresh_token, "r2");
    assert!(!client.store().is_refreshing());
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(5)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .and(header("Authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(favorite_json()))
        .expect(5)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, "r1", "a2", "r2").await;

    let client = Arc::new(signed_in(&mock_server, "a1", "r1"));

    let results = futures::future::join_all((0..5).map(|_| {
        let client = Arc::clone(&client);
        async move { client.list_favorites().await }
    }))
    .await;

    for result in results {
        assert_eq!(result.unwrap().len(), 1);
    }
    assert_eq!(client.context().coordinator().exchange_count(), 1);
}

#[tokio::test]
async fn test_request_is_retried_at_most_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, "r1", "a2", "r2").await;

    let client = signed_in(&mock_server, "a1", "r1");
    let (failures, _subscription) = count_failures(&client);

    let err = client.list_favorites().await.unwrap_err();
    assert_eq!(err.kind(), ErrorCode::Unauthorized);
    assert_eq!(err.status(), Some(401));
    assert!(err.is_handled());

    assert!(client.store().auth().is_none());
    assert_eq!(client.store().status(), AuthStatus::Unauthenticated);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_401_without_refresh_token_skips_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/watch/continue"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "token_expired",
            "message": "Access token expired"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server, "a1", "");
    let (failures, _subscription) = count_failures(&client);

    let err = client.continue_watching().await.unwrap_err();
    assert_eq!(err.code(), "token_expired");
    assert_eq!(err.kind(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "Access token expired");

    assert!(client.store().auth().is_none());
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(client.context().coordinator().exchange_count(), 0);
}

#[tokio::test]
async fn test_refresh_failure_ends_session_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(signed_in(&mock_server, "a1", "r1"));
    let (failures, _subscription) = count_failures(&client);

    let results = futures::future::join_all((0..3).map(|_| {
        let client = Arc::clone(&client);
        async move { client.list_favorites().await }
    }))
    .await;

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.code(), "unauthorized");
        assert_eq!(err.status(), Some(401));
    }
    assert!(client.store().auth().is_none());
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_refresh_is_not_itself_refreshed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "token_revoked",
            "message": "Refresh token revoked"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server, "a1", "r1");
    let (failures, _subscription) = count_failures(&client);

    let err = client.list_favorites().await.unwrap_err();
    assert_eq!(err.kind(), ErrorCode::Unauthorized);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert!(!client.context().coordinator().is_refreshing());
}

#[tokio::test]
async fn test_rotated_credential_is_persisted() {
    let mock_server = MockServer::start().await;
    let data_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .and(header("Authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(favorite_json()))
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, "r1", "a2", "r2").await;

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .credential_backend(Arc::new(FileBackend::new(data_dir.path())))
        .with_tokens("a1", "r1")
        .build()
        .unwrap();
    client.list_favorites().await.unwrap();
    client.flush().await;

    let next_run = ClientBuilder::default()
        .base_url(mock_server.uri())
        .credential_backend(Arc::new(FileBackend::new(data_dir.path())))
        .build()
        .unwrap();
    assert_eq!(next_run.store().access_token().as_deref(), Some("a2"));
    assert_eq!(next_run.store().refresh_token().as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_forbidden_is_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/favorites/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server, "a1", "r1");
    let (failures, _subscription) = count_failures(&client);

    let err = client
        .add_favorite(Uuid::parse_str(ANIME_ID).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "forbidden");
    assert_eq!(err.message(), "Access denied.");
    assert_eq!(err.status(), Some(403));

    assert!(client.store().auth().is_none());
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_terminal_failure_without_subscribers_navigates_home() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let navigator = Arc::new(MemoryNavigator::new("/watch/42"));
    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .with_tokens("a1", "r1")
        .navigator(navigator.clone())
        .build()
        .unwrap();

    assert!(client.me().await.is_err());
    assert_eq!(navigator.current_location(), "/");
}

#[tokio::test]
async fn test_server_error_has_no_auth_side_effects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/watch/progress"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "code": "db_unavailable",
            "message": "Database unavailable",
            "details": {"retry_after": 5}
        })))
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server, "a1", "r1");
    let (failures, _subscription) = count_failures(&client);

    let update = WatchProgressUpdate {
        anime_id: Uuid::parse_str(ANIME_ID).unwrap(),
        episode: 3,
        position_seconds: Some(600),
        progress_percent: None,
    };
    let err = client.update_watch_progress(&update).await.unwrap_err();

    assert_eq!(err.kind(), ErrorCode::ServerError);
    assert_eq!(err.code(), "db_unavailable");
    assert_eq!(err.details(), Some(&json!({"retry_after": 5})));
    assert!(client.store().auth().is_some());
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_timeout_is_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .with_tokens("a1", "r1")
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.list_favorites().await.unwrap_err();
    assert_eq!(err.kind(), ErrorCode::Timeout);
    assert_eq!(err.status(), None);
    assert!(client.store().auth().is_some());
}

#[tokio::test]
async fn test_short_search_query_makes_no_request() {
    let mock_server = MockServer::start().await;
    let client = signed_in(&mock_server, "a1", "r1");

    let err = client.search_anime(" a ", Page::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorCode::RequestFailed);
    assert_eq!(err.status(), None);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_login_stores_credential_and_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "mika@example.com", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "9a3c1e2f-5b6d-4e7f-8a9b-0c1d2e3f4a5b",
            "email": "mika@example.com",
            "is_active": true,
            "avatar": "https://cdn.example.com/mika.png",
            "created_at": "2024-01-01T00:00:00Z"
        })))
        .mount(&mock_server)
        .await;

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .build()
        .unwrap();
    let mut changes = client.store().subscribe();

    let credential = client.login("mika@example.com", "hunter22").await.unwrap();
    assert_eq!(credential.access_token, "a1");
    assert_eq!(
        credential.id.as_deref(),
        Some("9a3c1e2f-5b6d-4e7f-8a9b-0c1d2e3f4a5b")
    );
    assert_eq!(
        credential.avatar.as_deref(),
        Some("https://cdn.example.com/mika.png")
    );

    assert!(changes.has_changed().unwrap());
    assert_eq!(
        changes.borrow_and_update().status,
        AuthStatus::Authenticated
    );
    assert_eq!(client.store().auth(), Some(credential));
}

#[tokio::test]
async fn test_bad_credentials_do_not_broadcast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "invalid_credentials",
            "message": "Invalid email or password"
        })))
        .mount(&mock_server)
        .await;

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .build()
        .unwrap();
    let (failures, _subscription) = count_failures(&client);

    let err = client.login("mika@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.code(), "invalid_credentials");
    assert_eq!(err.message(), "Invalid email or password");
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert_eq!(client.context().coordinator().exchange_count(), 0);
}

#[tokio::test]
async fn test_logout_clears_even_when_revocation_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(body_json(json!({"refresh_token": "r1"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server, "a1", "r1");
    let (failures, _subscription) = count_failures(&client);

    client.logout().await;

    assert!(client.store().auth().is_none());
    assert_eq!(client.store().status(), AuthStatus::Unauthenticated);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}
