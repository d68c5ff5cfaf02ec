use axum::{
    Router,
    routing::{get, post},
};

use aidwallet_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    contract::deploy_wallet,
    health::{healthz, readyz},
    onboarding::run_onboarding,
    session::{logout, sync_session},
    wallet::{create_wallet, fund_wallet},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Session
        .route("/api/auth/sync", post(sync_session))
        .route("/api/auth/logout", post(logout))
        // Wallet
        .route("/api/wallet/create", post(create_wallet))
        .route("/api/wallet/fund", post(fund_wallet))
        .route("/api/contracts/wallet/deploy", post(deploy_wallet))
        // Orchestration
        .route("/api/onboarding", post(run_onboarding))
        .layer(trace_layer())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(state)
}
