use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use aidwallet_domain::onboarding::{OnboardingState, OnboardingStep};
use aidwallet_session_types::cookie::{clear_session_cookies, set_session_cookies};
use aidwallet_session_types::session::SessionTokens;

use crate::domain::types::DeployOverrides;
use crate::error::ProvisioningError;
use crate::handlers::UserResponse;
use crate::state::AppState;
use crate::usecase::onboarding::OnboardingInput;

// ── POST /api/onboarding ─────────────────────────────────────────────────────

fn enabled() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub store_secret: bool,
    #[serde(default = "enabled")]
    pub deploy: bool,
    #[serde(default = "enabled")]
    pub fund: bool,
    pub registry: Option<String>,
    pub usdc: Option<String>,
    pub defindex: Option<String>,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct OnboardingResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub state: OnboardingState,
    pub user: UserResponse,
    pub performed: Vec<OnboardingStep>,
}

pub async fn run_onboarding(
    State(state): State<AppState>,
    jar: CookieJar,
    tokens: SessionTokens,
    Json(body): Json<OnboardingRequest>,
) -> Response {
    let input = OnboardingInput {
        tokens,
        expected_email: body.email,
        persist_secret: body.store_secret,
        deploy: body.deploy,
        fund: body.fund,
        overrides: DeployOverrides {
            registry: body.registry,
            usdc: body.usdc,
            defindex: body.defindex,
            source: body.source,
        },
    };

    match state.onboarding().execute(input).await {
        Ok(out) => {
            let jar = set_session_cookies(jar, &out.rotated, state.cookies);
            let body = OnboardingResponse {
                ok: true,
                state: out.state,
                user: out.user.into(),
                performed: out.performed,
            };
            (jar, Json(body)).into_response()
        }
        Err(failed) => {
            // The client must sign out rather than continue under another identity.
            let jar = if matches!(failed.failure.error, ProvisioningError::IdentityMismatch) {
                clear_session_cookies(jar, state.cookies)
            } else {
                set_session_cookies(jar, &failed.rotated, state.cookies)
            };
            (jar, failed.failure).into_response()
        }
    }
}
