use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::state::AppState;

pub use aidwallet_core::health::healthz;

// ── GET /readyz ──────────────────────────────────────────────────────────────

pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "database ping failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
