//! Unit tests for the access token broker against in-memory doubles.


use fixtures::{InMemoryCredentials, ScriptedProvider};
use pollcal_calendar::auth::{is_credential_rejection, AccessTokenBroker};
use pollcal_calendar::error::TokenError;
use pollcal_common::services::ProviderError;
use std::sync::Arc;

const PROVIDER: &str = "testcal";
const USER: &str = "user-1";

fn broker(
    credentials: InMemoryCredentials,
    provider: ScriptedProvider,
) -> (Arc<InMemoryCredentials>, Arc<ScriptedProvider>, AccessTokenBroker) {
    let credentials = Arc::new(credentials);
    let provider = Arc::new(provider);
    let broker = AccessTokenBroker::new(credentials.clone(), provider.clone(), PROVIDER);
    (credentials, provider, broker)
}

#[tokio::test]
async fn test_no_stored_credential_yields_none_without_remote_call() {
    let (_, provider, broker) = broker(InMemoryCredentials::new(), ScriptedProvider::new());

    let token = broker.access_token(USER).await.unwrap();
    assert_eq!(token, None);
    assert_eq!(provider.token_call_count(), 0);
}

#[tokio::test]
async fn test_successful_refresh_returns_and_persists_the_grant() {
    let (credentials, provider, broker) = broker(
        InMemoryCredentials::with_credential(USER, PROVIDER, "refresh-1"),
        ScriptedProvider::new(),
    );

    let token = broker.access_token(USER).await.unwrap();
    assert_eq!(token.as_deref(), Some("access-token-1"));

    // The refresh secret sent to the token endpoint is the vaulted one.
    assert_eq!(
        provider.token_calls.lock().unwrap().as_slice(),
        &["refresh-1".to_string()]
    );

    let stored = credentials.stored(USER, PROVIDER).unwrap();
    assert_eq!(stored.refresh_secret, "refresh-1");
    assert_eq!(stored.access_secret.as_deref(), Some("access-token-1"));
    assert!(stored.access_expiry.is_some());
}

#[tokio::test]
async fn test_every_call_refreshes_again() {
    let (_, provider, broker) = broker(
        InMemoryCredentials::with_credential(USER, PROVIDER, "refresh-1"),
        ScriptedProvider::new(),
    );

    broker.access_token(USER).await.unwrap();
    broker.access_token(USER).await.unwrap();
    assert_eq!(provider.token_call_count(), 2);
}

#[tokio::test]
async fn test_rejected_grant_surfaces_the_oauth_code() {
    let (credentials, _, broker) = broker(
        InMemoryCredentials::with_credential(USER, PROVIDER, "refresh-1"),
        ScriptedProvider::new().with_token_error(ProviderError::TokenRejected {
            code: "invalid_grant".to_string(),
            description: "Token has been expired or revoked.".to_string(),
        }),
    );

    match broker.access_token(USER).await {
        Err(TokenError::Provider { code, .. }) => assert_eq!(code, "invalid_grant"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }

    // The dead refresh secret is left in place; reconnecting overwrites it.
    assert!(credentials.stored(USER, PROVIDER).is_some());
}

#[tokio::test]
async fn test_http_failure_becomes_a_synthetic_provider_code() {
    let (_, _, broker) = broker(
        InMemoryCredentials::with_credential(USER, PROVIDER, "refresh-1"),
        ScriptedProvider::new().with_token_error(ProviderError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        }),
    );

    match broker.access_token(USER).await {
        Err(TokenError::Provider { code, .. }) => assert_eq!(code, "http_503"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_transport_failure_becomes_request_failed() {
    let (_, _, broker) = broker(
        InMemoryCredentials::with_credential(USER, PROVIDER, "refresh-1"),
        ScriptedProvider::new()
            .with_token_error(ProviderError::Transport("dns error".to_string())),
    );

    assert!(matches!(
        broker.access_token(USER).await,
        Err(TokenError::RequestFailed(_))
    ));
}

#[test]
fn test_credential_rejection_codes() {
    for code in ["invalid_grant", "invalid_client", "unauthorized_client", "access_denied"] {
        assert!(is_credential_rejection(code));
    }
    assert!(!is_credential_rejection("temporarily_unavailable"));
    assert!(!is_credential_rejection("http_500"));
}
