mod common;

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use vox_portal::api::{auth, billing};
use vox_portal::client::{ApiClient, ClientError};
use vox_portal::session::{MemorySessionStore, SessionStore, TokenPair};

fn client_for(base_url: String, store: Arc<MemorySessionStore>) -> ApiClient {
    ApiClient::with_timeout(base_url, store, 5).expect("client construction")
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried_once() -> Result<()> {
    let upstream = common::spawn_upstream().await;
    // Stored pair is stale: only "a2" is accepted, "r1" rotates to it
    upstream.state.allow_access("a2");
    upstream.state.allow_refresh("r1", "a2", "r2");

    let store = Arc::new(MemorySessionStore::with_pair(TokenPair::new("a1", "r1")));
    let client = client_for(upstream.base_url(), store.clone());

    let wallet = billing::wallet_summary(&client).await?;
    assert_eq!(wallet.balance_cents, 1200);

    // Exactly two calls for the logical request: the 401 and the retry
    assert_eq!(upstream.state.count("wallet"), 2);
    assert_eq!(upstream.state.count("refresh"), 1);

    // The stored pair rotated
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().as_deref(), Some("r2"));
    Ok(())
}

#[tokio::test]
async fn failed_refresh_clears_session_without_looping() -> Result<()> {
    let upstream = common::spawn_upstream().await;
    // No refresh rotations registered: the refresh endpoint itself 401s

    let store = Arc::new(MemorySessionStore::with_pair(TokenPair::new("a1", "r1")));
    let client = client_for(upstream.base_url(), store.clone());

    let err = billing::wallet_summary(&client).await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));

    // One failed refresh, no recursion into a second one
    assert_eq!(upstream.state.count("refresh"), 1);
    assert_eq!(upstream.state.count("wallet"), 1);

    // Both tokens are gone
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    Ok(())
}

#[tokio::test]
async fn unauthenticated_request_does_not_attempt_refresh() -> Result<()> {
    let upstream = common::spawn_upstream().await;

    let store = Arc::new(MemorySessionStore::new());
    let client = client_for(upstream.base_url(), store.clone());

    // No token was sent, so a 401 is a plain error, not an expiry
    let err = billing::wallet_summary(&client).await.unwrap_err();
    assert!(matches!(err, ClientError::Backend { status: 401, .. }));
    assert_eq!(upstream.state.count("refresh"), 0);
    Ok(())
}

#[tokio::test]
async fn login_then_refresh_scenario() -> Result<()> {
    let upstream = common::spawn_upstream().await;
    let store = Arc::new(MemorySessionStore::new());
    let client = client_for(upstream.base_url(), store.clone());

    // Login stores the first pair
    auth::login(&client, "admin@acme.test", "secret").await?;
    assert_eq!(store.access_token().as_deref(), Some("a1"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));

    // Invalidate "a1" upstream and allow "r1" to rotate
    upstream.state.valid_access.lock().unwrap().clear();
    upstream.state.allow_access("a2");
    upstream.state.allow_refresh("r1", "a2", "r2");

    let wallet = billing::wallet_summary(&client).await?;
    assert_eq!(wallet.currency, "usd");
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().as_deref(), Some("r2"));
    Ok(())
}

#[tokio::test]
async fn bad_credentials_surface_as_backend_error() -> Result<()> {
    let upstream = common::spawn_upstream().await;
    let store = Arc::new(MemorySessionStore::new());
    let client = client_for(upstream.base_url(), store.clone());

    let err = auth::login(&client, "admin@acme.test", "wrong").await.unwrap_err();
    match err {
        ClientError::Backend { status, code, .. } => {
            assert_eq!(status, 401);
            assert_eq!(code, "UNAUTHORIZED");
        }
        other => panic!("expected backend error, got {other:?}"),
    }

    // Nothing stored on a failed login
    assert_eq!(store.access_token(), None);
    Ok(())
}

#[tokio::test]
async fn concurrent_expiries_share_one_refresh() -> Result<()> {
    let upstream = common::spawn_upstream().await;
    upstream.state.allow_access("a2");
    upstream.state.allow_refresh("r1", "a2", "r2");

    let store = Arc::new(MemorySessionStore::with_pair(TokenPair::new("a1", "r1")));
    let client = Arc::new(client_for(upstream.base_url(), store.clone()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = client.clone();
        handles.push(tokio::spawn(async move { billing::wallet_summary(&client).await }));
    }

    for handle in handles {
        let wallet = handle.await?.expect("request should recover via refresh");
        assert_eq!(wallet.balance_cents, 1200);
    }

    // All four expired requests coalesced onto a single refresh call
    assert_eq!(upstream.state.count("refresh"), 1);
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    Ok(())
}

#[tokio::test]
async fn logout_clears_session_even_when_upstream_rejects() -> Result<()> {
    let upstream = common::spawn_upstream().await;
    let store = Arc::new(MemorySessionStore::with_pair(TokenPair::new("a1", "r1")));
    let client = client_for(upstream.base_url(), store.clone());

    // /auth/logout is not a scripted route; the echo fallback answers it,
    // so the upstream call itself succeeds here. The point under test is
    // the local clear.
    auth::logout(&client).await?;
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    Ok(())
}

#[tokio::test]
async fn successful_envelope_wins_over_unusual_status() -> Result<()> {
    let upstream = common::spawn_upstream().await;
    upstream.state.allow_access("a1");

    let store = Arc::new(MemorySessionStore::with_pair(TokenPair::new("a1", "r1")));
    let client = client_for(upstream.base_url(), store);

    // 418 with a success envelope still decodes as a success
    let envelope = client.get("/teapot").await?;
    assert!(envelope.success);
    assert_eq!(envelope.data, json!({ "tea": true }));
    Ok(())
}
