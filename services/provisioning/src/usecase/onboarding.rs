//! Onboarding orchestration: sync → keypair → deploy → fund.
//!
//! Each step runs only while its own output is still missing, so re-invoking
//! after a partial failure resumes at the first incomplete step. Concurrent
//! runs rely on the single-winner writes of the store, not on a lock.

use tracing::{info, warn};

use aidwallet_domain::onboarding::{OnboardingState, OnboardingStep};
use aidwallet_domain::user::AccountStatus;
use aidwallet_session_types::session::{RotatedTokens, SessionTokens};

use crate::domain::repository::{AccountFunding, ContractChain, IdentityProvider, UserStore};
use crate::domain::types::{DeployOverrides, UserRecord};
use crate::error::{ProvisioningError, StepFailure};
use crate::usecase::deploy::{DeployContractUseCase, DeployInput, UserLookup};
use crate::usecase::fund::FundAccountUseCase;
use crate::usecase::keypair::{IssueKeypairInput, IssueKeypairUseCase};
use crate::usecase::session::SyncSessionUseCase;

pub struct OnboardingInput {
    pub tokens: SessionTokens,
    /// Identity the client believes is signed in. A mismatch aborts the run.
    pub expected_email: Option<String>,
    pub persist_secret: bool,
    pub deploy: bool,
    pub fund: bool,
    pub overrides: DeployOverrides,
}

#[derive(Debug)]
pub struct OnboardingOutput {
    pub user: UserRecord,
    pub state: OnboardingState,
    pub rotated: RotatedTokens,
    /// Steps that ran in this call, in order.
    pub performed: Vec<OnboardingStep>,
}

/// A failed run. Rotated tokens are still returned so the caller can store them.
#[derive(Debug)]
pub struct OnboardingFailure {
    pub failure: StepFailure,
    pub rotated: RotatedTokens,
}

impl OnboardingFailure {
    fn at(step: OnboardingStep, error: ProvisioningError, rotated: &RotatedTokens) -> Self {
        Self {
            failure: StepFailure { step, error },
            rotated: rotated.clone(),
        }
    }

    pub fn state(&self) -> OnboardingState {
        OnboardingState::Errored {
            step: self.failure.step,
            reason: self.failure.error.kind().to_owned(),
        }
    }
}

pub struct OnboardingUseCase<S, I, C, F>
where
    S: UserStore,
    I: IdentityProvider,
    C: ContractChain,
    F: AccountFunding,
{
    pub sync: SyncSessionUseCase<S, I>,
    pub keys: IssueKeypairUseCase<S>,
    pub deploy: DeployContractUseCase<S, C>,
    pub fund: FundAccountUseCase<S, F>,
}

impl<S, I, C, F> OnboardingUseCase<S, I, C, F>
where
    S: UserStore,
    I: IdentityProvider,
    C: ContractChain,
    F: AccountFunding,
{
    pub async fn execute(
        &self,
        input: OnboardingInput,
    ) -> Result<OnboardingOutput, OnboardingFailure> {
        let synced = self.sync.execute(&input.tokens).await.map_err(|f| {
            OnboardingFailure::at(OnboardingStep::Sync, f.error, &f.rotated)
        })?;
        let rotated = synced.rotated;
        let mut user = synced.user;
        let mut performed = vec![OnboardingStep::Sync];

        if let Some(expected) = input
            .expected_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            if !expected.eq_ignore_ascii_case(user.email.trim()) {
                warn!(user_id = %user.id, "session identity differs from expected account");
                return Err(OnboardingFailure::at(
                    OnboardingStep::Sync,
                    ProvisioningError::IdentityMismatch,
                    &rotated,
                ));
            }
        }

        if user.public_key.is_none() {
            let out = self
                .keys
                .execute(IssueKeypairInput {
                    user_id: user.id,
                    persist_secret: input.persist_secret,
                })
                .await
                .map_err(|e| OnboardingFailure::at(OnboardingStep::Keypair, e, &rotated))?;
            user = out.user;
            performed.push(OnboardingStep::Keypair);
        }

        if input.deploy && user.wallet_contract_id.is_none() {
            let out = self
                .deploy
                .execute(DeployInput {
                    user: UserLookup::Id(user.id),
                    public_key: None,
                    overrides: input.overrides,
                })
                .await
                .map_err(|e| OnboardingFailure::at(OnboardingStep::Deploy, e, &rotated))?;
            user = out.user;
            performed.push(OnboardingStep::Deploy);
        }

        // Funding follows a recorded deployment, never precedes it.
        if input.fund
            && user.wallet_contract_id.is_some()
            && user.account_status != AccountStatus::Funded
        {
            let out = self
                .fund
                .execute(user.id)
                .await
                .map_err(|e| OnboardingFailure::at(OnboardingStep::Fund, e, &rotated))?;
            user = out.user;
            performed.push(OnboardingStep::Fund);
        }

        let state = user.onboarding_state();
        info!(user_id = %user.id, ?state, ?performed, "onboarding run finished");
        Ok(OnboardingOutput {
            user,
            state,
            rotated,
            performed,
        })
    }
}
