use std::sync::atomic::Ordering;

use aidwallet_session_types::session::SessionTokens;

use aidwallet_provisioning::error::ProvisioningError;

use crate::helpers::{EMAIL, EXTERNAL_ID, FakeIdentity, Harness, MemoryUserStore, test_user};

fn tokens() -> SessionTokens {
    SessionTokens::new(Some("jwt-1".to_owned()), Some("refresh-1".to_owned()))
}

// ── SyncSessionUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_record_for_new_identity() {
    let h = Harness::empty();

    let out = h.sync().execute(&tokens()).await.unwrap();

    assert_eq!(out.user.external_id, EXTERNAL_ID);
    assert_eq!(out.user.email, EMAIL);
    assert!(out.user.public_key.is_none());
    assert!(out.rotated.is_empty());
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn should_reuse_record_for_known_identity() {
    let existing = test_user(EXTERNAL_ID, "old@example.com");
    let h = Harness::new(MemoryUserStore::new(vec![existing.clone()]));

    let out = h.sync().execute(&tokens()).await.unwrap();

    assert_eq!(out.user.id, existing.id);
    assert_eq!(out.user.email, EMAIL);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn should_reject_missing_refresh_token_without_creating_record() {
    let h = Harness::empty();
    let tokens = SessionTokens::new(Some("jwt-1".to_owned()), None);

    let result = h.sync().execute(&tokens).await;

    assert!(
        matches!(&result, Err(f) if matches!(f.error, ProvisioningError::Unauthenticated)),
        "expected Unauthenticated, got {result:?}"
    );
    assert_eq!(h.store.len(), 0);
    assert_eq!(h.identity.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn should_reject_revoked_refresh_token() {
    let mut h = Harness::empty();
    h.identity.revoked = vec!["refresh-1".to_owned()];

    let result = h.sync().execute(&tokens()).await;

    let failed = result.unwrap_err();
    assert!(matches!(failed.error, ProvisioningError::Unauthenticated));
    assert!(failed.rotated.is_empty());
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn should_return_rotated_tokens() {
    let mut h = Harness::empty();
    h.identity = FakeIdentity::new(EXTERNAL_ID, EMAIL).rotating("jwt-2", "refresh-2");

    let out = h.sync().execute(&tokens()).await.unwrap();

    assert_eq!(out.rotated.bearer.as_deref(), Some("jwt-2"));
    assert_eq!(out.rotated.refresh.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn should_omit_tokens_the_provider_echoed_back() {
    let mut h = Harness::empty();
    h.identity = FakeIdentity::new(EXTERNAL_ID, EMAIL).rotating("jwt-1", "refresh-2");

    let out = h.sync().execute(&tokens()).await.unwrap();

    assert!(out.rotated.bearer.is_none());
    assert_eq!(out.rotated.refresh.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn should_fail_profile_incomplete_without_email() {
    let mut h = Harness::empty();
    h.identity = FakeIdentity::new(EXTERNAL_ID, EMAIL).without_email();

    let result = h.sync().execute(&tokens()).await;

    assert!(
        matches!(&result, Err(f) if matches!(f.error, ProvisioningError::ProfileIncomplete)),
        "expected ProfileIncomplete, got {result:?}"
    );
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn should_retry_transient_profile_failures() {
    let mut h = Harness::empty();
    h.identity = FakeIdentity::new(EXTERNAL_ID, EMAIL).failing_profile(2);

    let out = h.sync().execute(&tokens()).await.unwrap();

    assert_eq!(out.user.email, EMAIL);
    assert_eq!(h.identity.profile_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.identity.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn should_surface_upstream_failure_after_retries_exhausted() {
    let mut h = Harness::empty();
    h.identity = FakeIdentity::new(EXTERNAL_ID, EMAIL).failing_profile(10);

    let result = h.sync().execute(&tokens()).await;

    let failed = result.unwrap_err();
    assert!(matches!(failed.error, ProvisioningError::UpstreamUnavailable(_)));
    assert_eq!(h.identity.profile_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn should_return_rotated_tokens_when_profile_fetch_fails() {
    let mut h = Harness::empty();
    h.identity = FakeIdentity::new(EXTERNAL_ID, EMAIL)
        .rotating("jwt-2", "refresh-2")
        .failing_profile(10);

    let failed = h.sync().execute(&tokens()).await.unwrap_err();

    assert_eq!(failed.error.kind(), "UPSTREAM_UNAVAILABLE");
    assert_eq!(failed.rotated.bearer.as_deref(), Some("jwt-2"));
    assert_eq!(failed.rotated.refresh.as_deref(), Some("refresh-2"));
    assert_eq!(h.identity.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn should_return_rotated_tokens_when_profile_is_incomplete() {
    let mut h = Harness::empty();
    h.identity = FakeIdentity::new(EXTERNAL_ID, EMAIL)
        .rotating("jwt-2", "refresh-2")
        .without_email();

    let failed = h.sync().execute(&tokens()).await.unwrap_err();

    assert!(matches!(failed.error, ProvisioningError::ProfileIncomplete));
    assert_eq!(failed.rotated.refresh.as_deref(), Some("refresh-2"));
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn should_create_one_record_for_concurrent_first_syncs() {
    let h = Harness::empty();

    let runs = (0..8).map(|_| {
        let sync = h.sync();
        tokio::spawn(async move { sync.execute(&tokens()).await })
    });
    let users: Vec<_> = futures::future::join_all(runs)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap().user)
        .collect();

    assert_eq!(h.store.len(), 1);
    assert!(users.iter().all(|u| u.id == users[0].id));
}
