//! Integration tests for the Secret Manager client
//!
//! Test coverage:
//! - Payload decoding and bearer authentication
//! - Retry of transient errors (5xx) and no retry of permanent ones (404)
//! - Token lookup through the metadata server

use mockito::Server;
use strata::domain::models::secret::FLIP_DB_PASSWORD;
use strata::infrastructure::secrets::{RetryPolicy, SecretManagerClient, SecretManagerConfig};
use strata::{SecretStore, SecretStoreError};

const SECRET_PATH: &str = "/v1/projects/flip-prod/secrets/flip-db-password/versions/latest:access";

fn payload_body(data: &str) -> String {
    serde_json::json!({
        "name": "projects/123/secrets/flip-db-password/versions/4",
        "payload": { "data": data }
    })
    .to_string()
}

fn client_for(base_url: String, retry: RetryPolicy) -> SecretManagerClient {
    let config = SecretManagerConfig {
        base_url,
        access_token: Some("test-token".to_string()),
        timeout_secs: 5,
        retry,
        ..Default::default()
    };
    SecretManagerClient::new(config).expect("Failed to create client")
}

#[tokio::test]
async fn test_access_latest_decodes_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", SECRET_PATH)
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(payload_body("czNjcjN0"))
        .create_async()
        .await;
    let client = client_for(server.url(), RetryPolicy::none());

    let bytes = client
        .access_latest("flip-prod", FLIP_DB_PASSWORD)
        .await
        .expect("Secret access failed");

    assert_eq!(bytes, b"s3cr3t".to_vec());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", SECRET_PATH)
        .with_status(503)
        .with_body("backend unavailable")
        .expect(3)
        .create_async()
        .await;
    let client = client_for(server.url(), RetryPolicy::new(2, 1, 5));

    let err = client
        .access_latest("flip-prod", FLIP_DB_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, SecretStoreError::Unavailable(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", SECRET_PATH)
        .with_status(404)
        .with_body(r#"{"error": {"code": 404, "status": "NOT_FOUND"}}"#)
        .expect(1)
        .create_async()
        .await;
    let client = client_for(server.url(), RetryPolicy::new(2, 1, 5));

    let err = client
        .access_latest("flip-prod", FLIP_DB_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, SecretStoreError::NotFound(ref name) if name.contains("flip-db-password")));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_permission_denied_is_classified() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", SECRET_PATH)
        .with_status(403)
        .create_async()
        .await;
    let client = client_for(server.url(), RetryPolicy::none());

    let err = client
        .access_latest("flip-prod", FLIP_DB_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, SecretStoreError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_invalid_base64_is_malformed_payload() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", SECRET_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(payload_body("***not base64***"))
        .create_async()
        .await;
    let client = client_for(server.url(), RetryPolicy::none());

    let err = client
        .access_latest("flip-prod", FLIP_DB_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, SecretStoreError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_metadata_token_is_fetched_once() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock(
            "GET",
            "/computeMetadata/v1/instance/service-accounts/default/token",
        )
        .match_header("metadata-flavor", "Google")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "meta-token", "expires_in": 3599, "token_type": "Bearer"}"#)
        .expect(1)
        .create_async()
        .await;
    let secret_mock = server
        .mock("GET", SECRET_PATH)
        .match_header("authorization", "Bearer meta-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(payload_body("czNjcjN0"))
        .expect(2)
        .create_async()
        .await;
    let config = SecretManagerConfig {
        base_url: server.url(),
        metadata_url: server.url(),
        access_token: None,
        retry: RetryPolicy::none(),
        ..Default::default()
    };
    let client = SecretManagerClient::new(config).expect("Failed to create client");

    client.access_latest("flip-prod", FLIP_DB_PASSWORD).await.unwrap();
    client.access_latest("flip-prod", FLIP_DB_PASSWORD).await.unwrap();

    token_mock.assert_async().await;
    secret_mock.assert_async().await;
}

#[tokio::test]
async fn test_metadata_failure_is_authentication_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock(
            "GET",
            "/computeMetadata/v1/instance/service-accounts/default/token",
        )
        .with_status(404)
        .create_async()
        .await;
    let config = SecretManagerConfig {
        base_url: server.url(),
        metadata_url: server.url(),
        access_token: None,
        retry: RetryPolicy::none(),
        ..Default::default()
    };
    let client = SecretManagerClient::new(config).expect("Failed to create client");

    let err = client
        .access_latest("flip-prod", FLIP_DB_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, SecretStoreError::Authentication(_)));
}
