use tracing::info;

use aidwallet_core::retry::{RetryPolicy, with_retry};
use aidwallet_domain::id::UserId;
use aidwallet_domain::user::AccountStatus;

use crate::domain::repository::{AccountFunding, UserStore};
use crate::domain::types::{FundingOutcome, UserRecord};
use crate::error::ProvisioningError;

#[derive(Debug)]
pub struct FundAccountOutput {
    pub user: UserRecord,
    pub outcome: FundingOutcome,
}

pub struct FundAccountUseCase<S: UserStore, F: AccountFunding> {
    pub store: S,
    pub funder: F,
    pub retry: RetryPolicy,
}

impl<S: UserStore, F: AccountFunding> FundAccountUseCase<S, F> {
    pub async fn execute(&self, user_id: UserId) -> Result<FundAccountOutput, ProvisioningError> {
        let user = self.load(user_id).await?;
        let public_key = user
            .public_key
            .clone()
            .ok_or(ProvisioningError::PublicKeyRequired)?;
        if user.account_status == AccountStatus::Funded {
            return Ok(FundAccountOutput {
                user,
                outcome: FundingOutcome::AlreadyFunded,
            });
        }

        let key = public_key.as_str();
        let outcome = with_retry(&self.retry, "fund account", || self.funder.fund(key)).await?;
        if self
            .store
            .advance_account_status(user_id, AccountStatus::Funded)
            .await?
        {
            info!(%user_id, ?outcome, "account funded");
        }

        let user = self.load(user_id).await?;
        Ok(FundAccountOutput { user, outcome })
    }

    async fn load(&self, id: UserId) -> Result<UserRecord, ProvisioningError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ProvisioningError::UserNotFound)
    }
}
