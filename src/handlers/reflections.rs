use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::{CreateReflectionRequest, ListReflectionsQuery, Reflection};
use crate::procedures::{Protected, UsageLimited};
use crate::state::AppState;

/// Record a reflection. Counts against the caller's monthly limit.
#[instrument(skip_all, fields(user_id = %ctx.user.id))]
pub async fn create_reflection(
    UsageLimited(ctx): UsageLimited,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReflectionRequest>,
) -> AppResult<(StatusCode, Json<Reflection>)> {
    let reflection = state
        .journal
        .create_reflection(ctx.user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(reflection)))
}

#[instrument(skip(ctx, state), fields(user_id = %ctx.user.id))]
pub async fn list_reflections(
    Protected(ctx): Protected,
    State(state): State<AppState>,
    Query(query): Query<ListReflectionsQuery>,
) -> AppResult<Json<Vec<Reflection>>> {
    Ok(Json(
        state
            .journal
            .list_reflections(ctx.user.id, query.dream_id)
            .await?,
    ))
}
