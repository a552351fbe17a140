//! Card Service
//!
//! Business logic for card assignments: orders entering a pipeline, stage
//! transitions, and the client-facing status projection.

use std::collections::HashMap;

use orderflow_core::domain::principal::Principal;
use orderflow_core::domain::stage::{Stage, SystemStatus};
use orderflow_core::dto::card::{CardView, OrderStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{card_repository, pipeline_repository, stage_repository};
use crate::service::{Error, Result, authorize};

/// Enter an order into a pipeline.
///
/// The card lands on the reserved pending stage. Entering an order that
/// already has a card is a no-op; the existing card keeps its stage.
pub async fn enter_pipeline(
    pool: &PgPool,
    principal: &Principal,
    pipeline_id: Uuid,
    order_id: Uuid,
) -> Result<CardView> {
    let pipeline = pipeline_repository::find_by_id(pool, pipeline_id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", pipeline_id))?;
    authorize(principal, &pipeline)?;

    let stages = stage_repository::list_by_pipeline(pool, pipeline_id).await?;
    let pending = stages
        .iter()
        .find(|s| s.system_status() == Some(SystemStatus::Pending))
        .ok_or_else(|| Error::conflict("pipeline has no pending stage"))?;

    let now = chrono::Utc::now();
    let card = match card_repository::insert_if_absent(pool, order_id, pipeline_id, pending.id, now)
        .await
        .map_err(classify_stage_race)?
    {
        Some(card) => {
            tracing::info!("Order {} entered pipeline {}", order_id, pipeline_id);
            card
        }
        None => card_repository::find_by_order(pool, order_id, pipeline_id)
            .await?
            .ok_or_else(|| Error::not_found("card", order_id))?,
    };

    // The card may sit on another stage when it already existed
    let stage = stages
        .iter()
        .find(|s| s.id == card.stage_id)
        .ok_or_else(|| Error::conflict("card references a missing stage"))?;

    Ok(CardView::new(&card, stage))
}

/// Move an order's card to a target stage of the pipeline.
///
/// Idempotent upsert keyed on `(order_id, pipeline_id)`: racing moves
/// converge on one row, last write wins on the transition timestamp.
pub async fn move_card(
    pool: &PgPool,
    principal: &Principal,
    pipeline_id: Uuid,
    order_id: Uuid,
    stage_id: Uuid,
) -> Result<CardView> {
    let pipeline = pipeline_repository::find_by_id(pool, pipeline_id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", pipeline_id))?;
    authorize(principal, &pipeline)?;

    // The target must belong to the given pipeline
    let stage = stage_repository::find_by_id(pool, stage_id)
        .await?
        .filter(|s| s.pipeline_id == pipeline_id)
        .ok_or_else(|| Error::not_found("stage", stage_id))?;

    let now = chrono::Utc::now();
    let card = card_repository::upsert_move(pool, order_id, pipeline_id, stage.id, now)
        .await
        .map_err(classify_stage_race)?;

    tracing::info!(
        "Order {} moved to stage {} in pipeline {}",
        order_id,
        stage_id,
        pipeline_id
    );

    Ok(CardView::new(&card, &stage))
}

/// List a pipeline's card assignments with their client statuses
pub async fn list_cards(
    pool: &PgPool,
    principal: &Principal,
    pipeline_id: Uuid,
) -> Result<Vec<CardView>> {
    let pipeline = pipeline_repository::find_by_id(pool, pipeline_id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", pipeline_id))?;
    authorize(principal, &pipeline)?;

    let stages = stage_repository::list_by_pipeline(pool, pipeline_id).await?;
    let by_id: HashMap<Uuid, &Stage> = stages.iter().map(|s| (s.id, s)).collect();

    let cards = card_repository::list_by_pipeline(pool, pipeline_id).await?;
    let mut views = Vec::with_capacity(cards.len());
    for card in &cards {
        let stage = by_id
            .get(&card.stage_id)
            .ok_or_else(|| Error::conflict("card references a missing stage"))?;
        views.push(CardView::new(card, stage));
    }

    Ok(views)
}

/// The reduced projection for the party who placed the order: the simplified
/// status only, never internal stage names.
///
/// Deliberately not ownership-checked; the caller only needs to be
/// authenticated.
pub async fn order_status(
    pool: &PgPool,
    pipeline_id: Uuid,
    order_id: Uuid,
) -> Result<OrderStatus> {
    let card = card_repository::find_by_order(pool, order_id, pipeline_id)
        .await?
        .ok_or_else(|| Error::not_found("card", order_id))?;

    let stage = stage_repository::find_by_id(pool, card.stage_id)
        .await?
        .ok_or_else(|| Error::conflict("card references a missing stage"))?;

    Ok(OrderStatus {
        order_id,
        client_status: stage.client_status(),
    })
}

/// Remove an order's card from a pipeline.
///
/// Called by the platform when the order itself is deleted or archived.
pub async fn remove_card(
    pool: &PgPool,
    principal: &Principal,
    pipeline_id: Uuid,
    order_id: Uuid,
) -> Result<()> {
    let pipeline = pipeline_repository::find_by_id(pool, pipeline_id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", pipeline_id))?;
    authorize(principal, &pipeline)?;

    let removed = card_repository::delete_by_order(pool, order_id, pipeline_id).await?;
    if !removed {
        return Err(Error::not_found("card", order_id));
    }

    tracing::info!("Card for order {} removed from pipeline {}", order_id, pipeline_id);

    Ok(())
}

/// A card write can lose its target stage to a concurrent stage deletion;
/// the foreign key turns that into a conflict, not an internal error.
fn classify_stage_race(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            Error::conflict("the target stage was removed concurrently")
        }
        _ => err.into(),
    }
}
