use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::models::{UsageResponse, UserProfile};
use crate::procedures::Protected;
use crate::state::AppState;

/// The caller's own profile.
#[instrument(skip_all, fields(user_id = %ctx.user.id))]
pub async fn me(Protected(ctx): Protected) -> Json<UserProfile> {
    Json(ctx.user().profile())
}

/// The caller's standing against their monthly reflection limit.
#[instrument(skip_all, fields(user_id = %ctx.user.id))]
pub async fn usage(Protected(ctx): Protected, State(state): State<AppState>) -> Json<UsageResponse> {
    Json(state.journal.usage(ctx.user()))
}
