//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use orderflow_core::domain::pipeline::Pipeline;
use orderflow_core::dto::pipeline::{
    CreatePipeline, PipelineDetail, PipelineSummary, UpdatePipeline,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::api::principal::AuthPrincipal;
use crate::service::pipeline_service;

/// POST /pipeline/create
/// Create a new pipeline with its reserved stages
pub async fn create_pipeline(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Creating pipeline: {}", req.name);

    let pipeline = pipeline_service::create_pipeline(&pool, &principal, req).await?;

    Ok(Json(pipeline))
}

/// GET /pipeline/list/{profile_id}
/// List a profile's pipelines
pub async fn list_pipelines(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PipelineSummary>>> {
    tracing::debug!("Listing pipelines for profile: {}", profile_id);

    let pipelines = pipeline_service::list_pipelines(&pool, &principal, profile_id).await?;

    Ok(Json(pipelines))
}

/// GET /pipeline/{id}
/// Get a pipeline with its ordered stages and client statuses
pub async fn get_pipeline(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineDetail>> {
    tracing::debug!("Getting pipeline: {}", id);

    let detail = pipeline_service::get_pipeline(&pool, &principal, id).await?;

    Ok(Json(detail))
}

/// PATCH /pipeline/{id}
/// Update a pipeline's name, description or display settings
pub async fn update_pipeline(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdatePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating pipeline: {}", id);

    let pipeline = pipeline_service::update_pipeline(&pool, &principal, id, patch).await?;

    Ok(Json(pipeline))
}

/// POST /pipeline/{id}/default
/// Make a pipeline its profile's default
pub async fn set_default_pipeline(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Setting default pipeline: {}", id);

    let pipeline = pipeline_service::set_default_pipeline(&pool, &principal, id).await?;

    Ok(Json(pipeline))
}

/// DELETE /pipeline/{id}
/// Delete a non-default pipeline that has no assigned cards
pub async fn delete_pipeline(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::delete_pipeline(&pool, &principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
