use chrono::{DateTime, Utc};
use secrecy::SecretString;

use aidwallet_domain::id::UserId;
use aidwallet_domain::onboarding::OnboardingState;
use aidwallet_domain::user::{AccountStatus, DeployStatus};

/// Provisioning record for one external identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub external_id: String,
    pub email: String,
    pub public_key: Option<String>,
    pub secret_ciphertext: Option<String>,
    pub wallet_contract_id: Option<String>,
    pub deploy_status: DeployStatus,
    pub account_status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn onboarding_state(&self) -> OnboardingState {
        OnboardingState::from_record(
            self.public_key.is_some(),
            self.deploy_status,
            self.wallet_contract_id.is_some(),
            self.account_status,
        )
    }
}

/// Result of refreshing a session with the identity provider.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub external_id: String,
    /// Bearer issued by the provider on this refresh, if any.
    pub bearer: Option<String>,
    /// Refresh token issued by the provider on this refresh, if any.
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderProfile {
    pub email: Option<String>,
}

/// Freshly generated ed25519 keypair.
#[derive(Debug)]
pub struct GeneratedKeypair {
    /// `G…` strkey.
    pub public_key: String,
    /// `S…` strkey.
    pub secret: SecretString,
}

/// Per-call address overrides for a deployment. Unset fields fall back to
/// [`DeployDefaults`].
#[derive(Debug, Clone, Default)]
pub struct DeployOverrides {
    pub registry: Option<String>,
    pub usdc: Option<String>,
    pub defindex: Option<String>,
    pub source: Option<String>,
}

/// Process-level deployment addresses.
#[derive(Debug, Clone, Default)]
pub struct DeployDefaults {
    pub registry: Option<String>,
    pub usdc: Option<String>,
    pub defindex: Option<String>,
    pub source: Option<String>,
}

/// Wallet contract constructor arguments plus the instantiation salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateRequest {
    /// Identity paying for the deployment.
    pub source: String,
    pub wasm_hash: String,
    pub salt: [u8; 32],
    /// Wallet owner (`G…`).
    pub owner: String,
    pub registry: String,
    /// Stable-asset token contract (`C…`).
    pub usdc: String,
    pub defindex: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingOutcome {
    Funded,
    /// The faucet reports the account already exists with a balance.
    AlreadyFunded,
}

// ── Constants ────────────────────────────────────────────────────────────────

pub const REGISTRY_ADDRESS: &str = "REGISTRY_ADDRESS";
pub const USDC_TOKEN_ADDRESS: &str = "USDC_TOKEN_ADDRESS";
pub const DEFINDEX_CONTRACT: &str = "DEFINDEX_CONTRACT";
pub const DEPLOY_SOURCE_ACCOUNT: &str = "DEPLOY_SOURCE_ACCOUNT";
pub const WALLET_WASM_PATH: &str = "WALLET_WASM_PATH";
pub const FRIENDBOT_URL: &str = "FRIENDBOT_URL";
