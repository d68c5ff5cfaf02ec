use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::domain::types::DeployOverrides;
use crate::error::ProvisioningError;
use crate::handlers::{UserResponse, parse_user_id};
use crate::state::AppState;
use crate::usecase::deploy::{DeployInput, UserLookup};

// ── POST /api/contracts/wallet/deploy ────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployWalletRequest {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub public_key: Option<String>,
    pub registry: Option<String>,
    pub usdc: Option<String>,
    pub defindex: Option<String>,
    pub source: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployWalletResponse {
    pub ok: bool,
    pub contract_id: String,
    pub deployed: bool,
    pub user: UserResponse,
}

pub async fn deploy_wallet(
    State(state): State<AppState>,
    Json(body): Json<DeployWalletRequest>,
) -> Result<impl IntoResponse, ProvisioningError> {
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let user = match (body.user_id.as_deref(), email) {
        (Some(raw), _) if !raw.trim().is_empty() => UserLookup::Id(parse_user_id(Some(raw))?),
        (_, Some(email)) => UserLookup::Email(email.to_owned()),
        _ => return Err(ProvisioningError::MissingUserId),
    };

    let out = state
        .deploy_contract()
        .execute(DeployInput {
            user,
            public_key: body.public_key.filter(|k| !k.trim().is_empty()),
            overrides: DeployOverrides {
                registry: body.registry,
                usdc: body.usdc,
                defindex: body.defindex,
                source: body.source,
            },
        })
        .await?;
    Ok(Json(DeployWalletResponse {
        ok: true,
        contract_id: out.contract_id,
        deployed: out.deployed,
        user: out.user.into(),
    }))
}
