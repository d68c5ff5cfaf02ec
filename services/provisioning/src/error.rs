use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use aidwallet_core::retry::RetryableError;
use aidwallet_domain::onboarding::OnboardingStep;

/// Provisioning service error variants.
///
/// Terminal variants carry enough detail to fix the cause. Retryable variants
/// render a generic message; their cause is logged, never serialized.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("session is missing or no longer valid")]
    Unauthenticated,
    #[error("identity profile has no email")]
    ProfileIncomplete,
    #[error("user not found")]
    UserNotFound,
    #[error("userId is required")]
    MissingUserId,
    #[error("user has no public key")]
    PublicKeyRequired,
    #[error("public key does not match the user's key")]
    PublicKeyMismatch,
    #[error("missing or invalid configuration: {var}")]
    ConfigMissing { var: &'static str },
    #[error("deploy source account {0:?} not found; provision it on the deployment host")]
    DeploySourceNotFound(String),
    #[error("secret encryption is unavailable")]
    EncryptionUnavailable,
    #[error("session identity does not match the expected account")]
    IdentityMismatch,
    #[error("chain node rejected the request: {0}")]
    ChainRejected(String),
    #[error("upstream service unavailable")]
    UpstreamUnavailable(#[source] anyhow::Error),
    #[error("funding service unavailable")]
    FundingServiceUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ProvisioningError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::ProfileIncomplete => "PROFILE_INCOMPLETE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::MissingUserId => "MISSING_USER_ID",
            Self::PublicKeyRequired => "PUBLIC_KEY_REQUIRED",
            Self::PublicKeyMismatch => "PUBLIC_KEY_MISMATCH",
            Self::ConfigMissing { .. } => "CONFIG_MISSING",
            Self::DeploySourceNotFound(_) => "DEPLOY_SOURCE_NOT_FOUND",
            Self::EncryptionUnavailable => "ENCRYPTION_UNAVAILABLE",
            Self::IdentityMismatch => "IDENTITY_MISMATCH",
            Self::ChainRejected(_) => "CHAIN_REJECTED",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::FundingServiceUnavailable(_) => "FUNDING_SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::ProfileIncomplete
            | Self::MissingUserId
            | Self::PublicKeyRequired
            | Self::ConfigMissing { .. } => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::IdentityMismatch | Self::PublicKeyMismatch => StatusCode::CONFLICT,
            Self::UpstreamUnavailable(_) | Self::FundingServiceUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::DeploySourceNotFound(_)
            | Self::ChainRejected(_)
            | Self::EncryptionUnavailable
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        // Client errors are already visible through the TraceLayer status line.
        match self {
            Self::Internal(e) => tracing::error!(error = %e, kind = "INTERNAL", "internal error"),
            Self::UpstreamUnavailable(e) | Self::FundingServiceUnavailable(e) => {
                tracing::warn!(error = %e, kind = self.kind(), "upstream failure")
            }
            Self::DeploySourceNotFound(source) => {
                tracing::error!(deploy_source = %source, kind = self.kind(), "deploy source missing")
            }
            Self::ChainRejected(reason) => {
                tracing::error!(reason = %reason, kind = self.kind(), "chain request rejected")
            }
            Self::EncryptionUnavailable => {
                tracing::error!(kind = self.kind(), "encryption key missing or malformed")
            }
            _ => {}
        }
    }

    fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        })
    }
}

impl RetryableError for ProvisioningError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::FundingServiceUnavailable(_) | Self::Internal(_)
        )
    }
}

impl From<sea_orm::DbErr> for ProvisioningError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for ProvisioningError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), axum::Json(self.body())).into_response()
    }
}

/// An orchestration failure, tagged with the step that failed.
#[derive(Debug, thiserror::Error)]
#[error("{step:?} step failed: {error}")]
pub struct StepFailure {
    pub step: OnboardingStep,
    #[source]
    pub error: ProvisioningError,
}

impl IntoResponse for StepFailure {
    fn into_response(self) -> Response {
        self.error.log();
        let mut body = self.error.body();
        body["step"] = serde_json::Value::from(self.step.as_str());
        body["retryable"] = serde_json::Value::from(self.error.is_retryable());
        (self.error.status(), axum::Json(body)).into_response()
    }
}
