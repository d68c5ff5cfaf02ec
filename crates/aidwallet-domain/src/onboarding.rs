//! Onboarding progress model.
//!
//! A user moves `Unsynced → Synced → Keyed → Deployed → Funded`. A terminal
//! failure of any step parks the run in `Errored` until the caller re-invokes
//! the orchestration, which resumes at the first incomplete step.

use serde::{Deserialize, Serialize};

use crate::user::{AccountStatus, DeployStatus};

/// One step of the provisioning sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStep {
    Sync,
    Keypair,
    Deploy,
    Fund,
}

impl OnboardingStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Keypair => "keypair",
            Self::Deploy => "deploy",
            Self::Fund => "fund",
        }
    }
}

/// Where a user stands in the provisioning sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum OnboardingState {
    Unsynced,
    Synced,
    Keyed,
    Deployed,
    Funded,
    Errored { step: OnboardingStep, reason: String },
}

impl OnboardingState {
    /// Derive the state of a synced record from its persisted fields.
    ///
    /// Funding only counts once a contract is recorded: a funded key with no
    /// contract is still `Keyed`, since the sequence funds after deployment.
    pub fn from_record(
        has_public_key: bool,
        deploy_status: DeployStatus,
        has_wallet_contract: bool,
        account_status: AccountStatus,
    ) -> Self {
        let deployed = has_wallet_contract || deploy_status == DeployStatus::Deployed;
        match (has_public_key, deployed, account_status) {
            (false, _, _) => Self::Synced,
            (true, false, _) => Self::Keyed,
            (true, true, AccountStatus::Funded) => Self::Funded,
            (true, true, _) => Self::Deployed,
        }
    }

    /// The next step a resumed run has to perform, or `None` when complete.
    pub fn next_step(&self) -> Option<OnboardingStep> {
        match self {
            Self::Unsynced => Some(OnboardingStep::Sync),
            Self::Synced => Some(OnboardingStep::Keypair),
            Self::Keyed => Some(OnboardingStep::Deploy),
            Self::Deployed => Some(OnboardingStep::Fund),
            Self::Funded => None,
            Self::Errored { step, .. } => Some(*step),
        }
    }
}
