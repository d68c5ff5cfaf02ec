use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::domain::types::FundingOutcome;
use crate::error::ProvisioningError;
use crate::handlers::{UserResponse, parse_user_id};
use crate::state::AppState;
use crate::usecase::keypair::IssueKeypairInput;

// ── POST /api/wallet/create ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub store_secret: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletResponse {
    pub public_key: String,
    pub stored_secret: bool,
    pub user: UserResponse,
}

pub async fn create_wallet(
    State(state): State<AppState>,
    Json(body): Json<CreateWalletRequest>,
) -> Result<impl IntoResponse, ProvisioningError> {
    let user_id = parse_user_id(body.user_id.as_deref())?;
    let out = state
        .issue_keypair()
        .execute(IssueKeypairInput {
            user_id,
            persist_secret: body.store_secret,
        })
        .await?;
    Ok(Json(CreateWalletResponse {
        public_key: out.public_key,
        stored_secret: out.secret_stored,
        user: out.user.into(),
    }))
}

// ── POST /api/wallet/fund ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundWalletRequest {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundWalletResponse {
    pub ok: bool,
    pub already_funded: bool,
    pub user: UserResponse,
}

pub async fn fund_wallet(
    State(state): State<AppState>,
    Json(body): Json<FundWalletRequest>,
) -> Result<impl IntoResponse, ProvisioningError> {
    let user_id = parse_user_id(body.user_id.as_deref())?;
    let out = state.fund_account().execute(user_id).await?;
    Ok(Json(FundWalletResponse {
        ok: true,
        already_funded: out.outcome == FundingOutcome::AlreadyFunded,
        user: out.user.into(),
    }))
}
