//! Stage API Handlers
//!
//! HTTP endpoints for stage management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use orderflow_core::dto::stage::{CreateStage, StageView, UpdateStage};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::api::principal::AuthPrincipal;
use crate::service::stage_service;

/// POST /pipeline/{id}/stages
/// Create a custom stage within the pipeline's customizable region
pub async fn create_stage(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(pipeline_id): Path<Uuid>,
    Json(req): Json<CreateStage>,
) -> ApiResult<Json<StageView>> {
    tracing::info!("Creating stage {} in pipeline {}", req.name, pipeline_id);

    let stage = stage_service::create_stage(&pool, &principal, pipeline_id, req).await?;

    Ok(Json(stage.into()))
}

/// PATCH /stage/{id}
/// Rename and/or reorder a stage
pub async fn update_stage(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateStage>,
) -> ApiResult<Json<StageView>> {
    tracing::info!("Updating stage: {}", id);

    let stage = stage_service::update_stage(&pool, &principal, id, patch).await?;

    Ok(Json(stage.into()))
}

/// DELETE /stage/{id}
/// Delete a custom stage that has no assigned cards
pub async fn delete_stage(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting stage: {}", id);

    stage_service::delete_stage(&pool, &principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
