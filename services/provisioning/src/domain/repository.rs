#![allow(async_fn_in_trait)]

use aidwallet_domain::id::UserId;
use aidwallet_domain::user::AccountStatus;

use crate::domain::types::{
    FundingOutcome, InstantiateRequest, ProviderProfile, ProviderSession, UserRecord,
};
use crate::error::ProvisioningError;

/// Durable store of provisioning records.
///
/// Every setter is a single conditional write. It returns `true` only for the
/// caller whose write took effect; a `false` means another writer got there
/// first and the caller must re-read.
pub trait UserStore: Send + Sync {
    /// Insert a record for a never-seen `external_id`, or update the email of the
    /// existing one. Concurrent calls for the same identity yield one record.
    async fn upsert_by_external_id(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<UserRecord, ProvisioningError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, ProvisioningError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ProvisioningError>;

    /// Set `public_key` if still empty, moving `account_status` to `created`.
    async fn set_public_key_if_absent(
        &self,
        id: UserId,
        public_key: &str,
    ) -> Result<bool, ProvisioningError>;

    /// Set `secret_ciphertext` if still empty and `public_key` equals `public_key`.
    async fn set_secret_ciphertext_if_absent(
        &self,
        id: UserId,
        public_key: &str,
        ciphertext: &str,
    ) -> Result<bool, ProvisioningError>;

    /// Set `wallet_contract_id` if still empty, moving `deploy_status` to `deployed`.
    async fn set_wallet_contract_if_absent(
        &self,
        id: UserId,
        contract_id: &str,
    ) -> Result<bool, ProvisioningError>;

    /// Move `account_status` forward to `status`. Never moves it back.
    async fn advance_account_status(
        &self,
        id: UserId,
        status: AccountStatus,
    ) -> Result<bool, ProvisioningError>;
}

/// Port to the external identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Validate the session and return the subject, plus any rotated tokens.
    async fn refresh_session(
        &self,
        bearer: Option<&str>,
        refresh: &str,
    ) -> Result<ProviderSession, ProvisioningError>;

    async fn fetch_profile(&self, external_id: &str) -> Result<ProviderProfile, ProvisioningError>;
}

/// Port to the chain node that installs and instantiates wallet contracts.
pub trait ContractChain: Send + Sync {
    /// Whether the deployment identity exists and can sign on this node.
    async fn source_account_exists(&self, source: &str) -> Result<bool, ProvisioningError>;

    /// Upload the wallet wasm and return its hash. Uploading identical code is a no-op.
    async fn install_wasm(&self, source: &str, wasm: &[u8]) -> Result<String, ProvisioningError>;

    /// Create a wallet instance and return its contract id.
    async fn instantiate(&self, request: &InstantiateRequest)
    -> Result<String, ProvisioningError>;

    async fn contract_exists(&self, contract_id: &str) -> Result<bool, ProvisioningError>;
}

/// Port to the network faucet.
pub trait AccountFunding: Send + Sync {
    async fn fund(&self, public_key: &str) -> Result<FundingOutcome, ProvisioningError>;
}
