use aidwallet_domain::id::UserId;
use aidwallet_domain::user::AccountStatus;

use aidwallet_provisioning::domain::types::FundingOutcome;
use aidwallet_provisioning::error::ProvisioningError;

use crate::helpers::{
    EMAIL, EXTERNAL_ID, FakeFunder, Harness, MemoryUserStore, deployed_user, test_user,
};

// ── FundAccountUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_fund_account_and_mark_it_funded() {
    let user = deployed_user();
    let h = Harness::new(MemoryUserStore::new(vec![user.clone()]));

    let out = h.fund().execute(user.id).await.unwrap();

    assert_eq!(out.outcome, FundingOutcome::Funded);
    assert_eq!(out.user.account_status, AccountStatus::Funded);
    assert_eq!(h.funder.call_count(), 1);
}

#[tokio::test]
async fn should_treat_already_funded_report_as_success() {
    let user = deployed_user();
    let mut h = Harness::new(MemoryUserStore::new(vec![user.clone()]));
    h.funder = FakeFunder::default().with_funded(user.public_key.as_deref().unwrap());

    let out = h.fund().execute(user.id).await.unwrap();

    assert_eq!(out.outcome, FundingOutcome::AlreadyFunded);
    assert_eq!(out.user.account_status, AccountStatus::Funded);
}

#[tokio::test]
async fn should_skip_faucet_for_funded_account() {
    let user = deployed_user();
    let h = Harness::new(MemoryUserStore::new(vec![user.clone()]));

    h.fund().execute(user.id).await.unwrap();
    let out = h.fund().execute(user.id).await.unwrap();

    assert_eq!(out.outcome, FundingOutcome::AlreadyFunded);
    assert_eq!(h.funder.call_count(), 1);
}

#[tokio::test]
async fn should_require_public_key() {
    let user = test_user(EXTERNAL_ID, EMAIL);
    let h = Harness::new(MemoryUserStore::new(vec![user.clone()]));

    let result = h.fund().execute(user.id).await;

    assert!(
        matches!(result, Err(ProvisioningError::PublicKeyRequired)),
        "expected PublicKeyRequired, got {result:?}"
    );
    assert_eq!(h.funder.call_count(), 0);
}

#[tokio::test]
async fn should_fail_user_not_found_for_unknown_user() {
    let h = Harness::empty();

    let result = h.fund().execute(UserId::generate()).await;

    assert!(matches!(result, Err(ProvisioningError::UserNotFound)));
}

#[tokio::test]
async fn should_retry_transient_faucet_failures() {
    let user = deployed_user();
    let mut h = Harness::new(MemoryUserStore::new(vec![user.clone()]));
    h.funder = FakeFunder::default().failing(2);

    let out = h.fund().execute(user.id).await.unwrap();

    assert_eq!(out.outcome, FundingOutcome::Funded);
    assert_eq!(h.funder.call_count(), 3);
}

#[tokio::test]
async fn should_leave_status_unchanged_when_faucet_stays_down() {
    let user = deployed_user();
    let mut h = Harness::new(MemoryUserStore::new(vec![user.clone()]));
    h.funder = FakeFunder::default().failing(10);

    let result = h.fund().execute(user.id).await;

    assert!(
        matches!(result, Err(ProvisioningError::FundingServiceUnavailable(_))),
        "expected FundingServiceUnavailable, got {result:?}"
    );
    assert_eq!(
        h.store.get(user.id).unwrap().account_status,
        AccountStatus::Created
    );
}
