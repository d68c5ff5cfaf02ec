use tracing::info;

use aidwallet_core::retry::{RetryPolicy, with_retry};
use aidwallet_session_types::session::{RotatedTokens, SessionTokens};

use crate::domain::repository::{IdentityProvider, UserStore};
use crate::domain::types::UserRecord;
use crate::error::ProvisioningError;

#[derive(Debug)]
pub struct SyncSessionOutput {
    pub user: UserRecord,
    /// Tokens the provider rotated. Callers must store them before the next call.
    pub rotated: RotatedTokens,
}

/// A failed sync. Once the refresh succeeded the old refresh token may be
/// spent, so any rotated pair travels with the error.
#[derive(Debug)]
pub struct SyncFailure {
    pub error: ProvisioningError,
    pub rotated: RotatedTokens,
}

// Transparent: display and source forward to the inner error.
impl std::fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for SyncFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

impl From<ProvisioningError> for SyncFailure {
    fn from(error: ProvisioningError) -> Self {
        Self {
            error,
            rotated: RotatedTokens::default(),
        }
    }
}

pub struct SyncSessionUseCase<S: UserStore, I: IdentityProvider> {
    pub store: S,
    pub identity: I,
    pub retry: RetryPolicy,
}

impl<S: UserStore, I: IdentityProvider> SyncSessionUseCase<S, I> {
    pub async fn execute(&self, tokens: &SessionTokens) -> Result<SyncSessionOutput, SyncFailure> {
        let refresh = tokens
            .refresh
            .as_deref()
            .ok_or(ProvisioningError::Unauthenticated)?;

        // Never retried: a refresh token may be spent by the first attempt.
        let session = self
            .identity
            .refresh_session(tokens.bearer.as_deref(), refresh)
            .await?;
        let rotated = RotatedTokens::diff(tokens, session.bearer, session.refresh);

        match self.load_user(&session.external_id).await {
            Ok(user) => {
                info!(user_id = %user.id, rotated = !rotated.is_empty(), "session synced");
                Ok(SyncSessionOutput { user, rotated })
            }
            Err(error) => Err(SyncFailure { error, rotated }),
        }
    }

    async fn load_user(&self, external_id: &str) -> Result<UserRecord, ProvisioningError> {
        let profile = with_retry(&self.retry, "fetch identity profile", || {
            self.identity.fetch_profile(external_id)
        })
        .await?;
        let email = profile
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ProvisioningError::ProfileIncomplete)?;

        self.store.upsert_by_external_id(external_id, email).await
    }
}
