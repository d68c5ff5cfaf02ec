use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use aidwallet_session_types::cookie::{clear_session_cookies, set_session_cookies};
use aidwallet_session_types::session::SessionTokens;

use crate::handlers::UserResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ── POST /api/auth/sync ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SyncResponse {
    pub ok: bool,
    pub user: UserResponse,
}

pub async fn sync_session(
    State(state): State<AppState>,
    jar: CookieJar,
    tokens: SessionTokens,
) -> Response {
    match state.sync_session().execute(&tokens).await {
        Ok(out) => {
            let jar = set_session_cookies(jar, &out.rotated, state.cookies);
            let body = SyncResponse {
                ok: true,
                user: out.user.into(),
            };
            (jar, Json(body)).into_response()
        }
        // A rotated pair must reach the client even when the sync fails.
        Err(failed) => {
            let jar = set_session_cookies(jar, &failed.rotated, state.cookies);
            (jar, failed.error).into_response()
        }
    }
}

// ── POST /api/auth/logout ────────────────────────────────────────────────────

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (
        clear_session_cookies(jar, state.cookies),
        Json(OkResponse { ok: true }),
    )
}
