pub mod contract;
pub mod health;
pub mod onboarding;
pub mod session;
pub mod wallet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use aidwallet_domain::id::UserId;
use aidwallet_domain::user::{AccountStatus, DeployStatus};

use crate::domain::types::UserRecord;
use crate::error::ProvisioningError;

/// User as rendered to clients. Never includes the secret ciphertext.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_contract_id: Option<String>,
    pub deploy_status: DeployStatus,
    pub account_status: AccountStatus,
    #[serde(serialize_with = "aidwallet_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            public_key: user.public_key,
            wallet_contract_id: user.wallet_contract_id,
            deploy_status: user.deploy_status,
            account_status: user.account_status,
            updated_at: user.updated_at,
        }
    }
}

/// Parse a `userId` body field. Absent or blank is `MISSING_USER_ID`; a value
/// that is not a valid id cannot name a user, so it is `USER_NOT_FOUND`.
pub(crate) fn parse_user_id(raw: Option<&str>) -> Result<UserId, ProvisioningError> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ProvisioningError::MissingUserId)?
        .parse()
        .map_err(|_| ProvisioningError::UserNotFound)
}
