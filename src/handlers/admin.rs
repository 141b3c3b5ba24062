//! Account administration for creators and admins.

use axum::Json;
use axum::extract::{Path, State};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::{UpdateTierRequest, UserProfile};
use crate::procedures::Creator;
use crate::state::AppState;

/// All accounts, oldest first.
#[instrument(skip_all, fields(user_id = %ctx.user.id))]
pub async fn list_users(Creator(ctx): Creator, State(state): State<AppState>) -> Json<Vec<UserProfile>> {
    let users = state.store.list_users().await;
    Json(users.iter().map(UserProfile::from).collect())
}

/// Move an account to a different tier. Takes effect on its next request.
#[instrument(skip(ctx, state), fields(user_id = %ctx.user.id))]
pub async fn update_tier(
    Creator(ctx): Creator,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTierRequest>,
) -> AppResult<Json<UserProfile>> {
    let user = state.store.set_tier(id, payload.tier).await?;
    info!(target_user = %user.id, tier = %user.tier, "Tier changed");
    Ok(Json(user.profile()))
}
