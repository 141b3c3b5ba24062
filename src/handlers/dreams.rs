//! Dream endpoints.
//!
//! Reads use the `protected` procedure; anything that changes a dream uses
//! `write`, which turns demo accounts away. The evolution report is
//! `premium`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::{CreateDreamRequest, Dream, EvolutionReport, UpdateDreamRequest};
use crate::procedures::{Premium, Protected, Write};
use crate::state::AppState;

#[instrument(skip_all, fields(user_id = %ctx.user.id))]
pub async fn list_dreams(
    Protected(ctx): Protected,
    State(state): State<AppState>,
) -> Json<Vec<Dream>> {
    Json(state.journal.list_dreams(ctx.user.id).await)
}

#[instrument(skip(ctx, state), fields(user_id = %ctx.user.id))]
pub async fn get_dream(
    Protected(ctx): Protected,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Dream>> {
    Ok(Json(state.journal.get_dream(ctx.user.id, id).await?))
}

#[instrument(skip_all, fields(user_id = %ctx.user.id))]
pub async fn create_dream(
    Write(ctx): Write,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDreamRequest>,
) -> AppResult<(StatusCode, Json<Dream>)> {
    let dream = state.journal.create_dream(ctx.user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(dream)))
}

#[instrument(skip(ctx, state, payload), fields(user_id = %ctx.user.id))]
pub async fn update_dream(
    Write(ctx): Write,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateDreamRequest>,
) -> AppResult<Json<Dream>> {
    Ok(Json(
        state.journal.update_dream(ctx.user.id, id, payload).await?,
    ))
}

#[instrument(skip(ctx, state), fields(user_id = %ctx.user.id))]
pub async fn delete_dream(
    Write(ctx): Write,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.journal.delete_dream(ctx.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generate an evolution report over the dream's reflections.
#[instrument(skip(ctx, state), fields(user_id = %ctx.user.id))]
pub async fn evolution_report(
    Premium(ctx): Premium,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EvolutionReport>> {
    Ok(Json(state.journal.evolution_report(ctx.user.id, id).await?))
}
