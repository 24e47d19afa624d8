//! Authentication integration tests for anistream-cli
//! Tests sign-in persistence across runs and session-gated commands

use anistream_cli::cli::handlers::{self, auth};
use anistream_cli::CliError;
use anistream_sdk::{AuthStatus, ClientConfig};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, data_dir: &TempDir) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = server.uri();
    config.storage.data_dir = Some(data_dir.path().to_path_buf());
    config
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "9a3c1e2f-5b6d-4e7f-8a9b-0c1d2e3f4a5b",
            "email": "mika@example.com",
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_persists_between_runs() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    mount_login(&server).await;
    let config = config_for(&server, &data_dir);

    let client = handlers::build_client(&config).unwrap();
    auth::handle_login(&client, "mika@example.com", "hunter22", true)
        .await
        .unwrap();
    assert!(data_dir.path().join("auth.json").exists());

    let next_run = handlers::build_client(&config).unwrap();
    assert_eq!(next_run.store().status(), AuthStatus::Authenticated);
    assert_eq!(next_run.store().access_token().as_deref(), Some("a1"));
    auth::handle_whoami(&next_run, true).await.unwrap();
}

#[tokio::test]
async fn test_whoami_requires_session() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let client = handlers::build_client(&config_for(&server, &data_dir)).unwrap();

    let result = auth::handle_whoami(&client, false).await;
    assert!(matches!(result, Err(CliError::NotSignedIn)));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_logout_forgets_persisted_session() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(body_json(json!({"refresh_token": "r1"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let config = config_for(&server, &data_dir);

    let client = handlers::build_client(&config).unwrap();
    auth::handle_login(&client, "mika@example.com", "hunter22", true)
        .await
        .unwrap();
    auth::handle_logout(&client).await.unwrap();

    let next_run = handlers::build_client(&config).unwrap();
    assert_eq!(next_run.store().status(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_rejected_login_surfaces_api_error() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "invalid_credentials",
            "message": "Invalid email or password"
        })))
        .mount(&server)
        .await;

    let client = handlers::build_client(&config_for(&server, &data_dir)).unwrap();
    let err = auth::handle_login(&client, "mika@example.com", "wrong", false)
        .await
        .unwrap_err();

    match err {
        CliError::Api(api) => assert_eq!(api.code(), "invalid_credentials"),
        other => panic!("unexpected error: {other:?}"),
    }
}
