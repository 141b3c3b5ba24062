//! Public account endpoints. No procedure guards apply here.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::{AuthResponse, SignInRequest, SignUpRequest};
use crate::state::AppState;

/// Create an account and return a session for it.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let session = state.auth.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip_all)]
pub async fn signin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.auth.signin(payload).await?))
}

/// Start a session on the shared, read-only demo account.
#[instrument(skip(state))]
pub async fn demo(State(state): State<AppState>) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.auth.demo_session().await?))
}
