//! Card API Handlers
//!
//! HTTP endpoints for card assignments and the client status projection.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use orderflow_core::dto::card::{CardView, EnterPipeline, MoveCard, OrderStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::api::principal::AuthPrincipal;
use crate::service::card_service;

/// GET /pipeline/{id}/cards
/// List a pipeline's card assignments for board rendering
pub async fn list_cards(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(pipeline_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CardView>>> {
    tracing::debug!("Listing cards of pipeline: {}", pipeline_id);

    let cards = card_service::list_cards(&pool, &principal, pipeline_id).await?;

    Ok(Json(cards))
}

/// POST /pipeline/{id}/cards
/// Enter an order into the pipeline on its pending stage
pub async fn enter_pipeline(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(pipeline_id): Path<Uuid>,
    Json(req): Json<EnterPipeline>,
) -> ApiResult<Json<CardView>> {
    tracing::info!("Order {} entering pipeline {}", req.order_id, pipeline_id);

    let card =
        card_service::enter_pipeline(&pool, &principal, pipeline_id, req.order_id).await?;

    Ok(Json(card))
}

/// POST /pipeline/{id}/cards/{order_id}/move
/// Move an order's card to a target stage
pub async fn move_card(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path((pipeline_id, order_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<MoveCard>,
) -> ApiResult<Json<CardView>> {
    tracing::info!(
        "Moving order {} to stage {} in pipeline {}",
        order_id,
        req.stage_id,
        pipeline_id
    );

    let card =
        card_service::move_card(&pool, &principal, pipeline_id, order_id, req.stage_id).await?;

    Ok(Json(card))
}

/// GET /pipeline/{id}/cards/{order_id}/status
/// The reduced client-facing projection: simplified status only
pub async fn order_status(
    State(pool): State<PgPool>,
    AuthPrincipal(_principal): AuthPrincipal,
    Path((pipeline_id, order_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OrderStatus>> {
    tracing::debug!("Getting status of order {} in pipeline {}", order_id, pipeline_id);

    let status = card_service::order_status(&pool, pipeline_id, order_id).await?;

    Ok(Json(status))
}

/// DELETE /pipeline/{id}/cards/{order_id}
/// Remove an order's card (order deleted or archived upstream)
pub async fn remove_card(
    State(pool): State<PgPool>,
    AuthPrincipal(principal): AuthPrincipal,
    Path((pipeline_id, order_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    tracing::info!("Removing card of order {} from pipeline {}", order_id, pipeline_id);

    card_service::remove_card(&pool, &principal, pipeline_id, order_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
