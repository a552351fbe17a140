//! Card Repository
//!
//! Handles all database operations related to card assignments.

use orderflow_core::domain::card::Card;
use sqlx::PgExecutor;
use uuid::Uuid;

/// Move an order's card to a stage, creating the card if the order has none.
///
/// The upsert is keyed on `(order_id, pipeline_id)`, so racing moves
/// converge on a single row; the transition timestamp is last-write-wins.
pub async fn upsert_move(
    executor: impl PgExecutor<'_>,
    order_id: Uuid,
    pipeline_id: Uuid,
    stage_id: Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Card, sqlx::Error> {
    let row = sqlx::query_as::<_, CardRow>(
        r#"
        INSERT INTO cards (id, order_id, pipeline_id, stage_id, moved_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (order_id, pipeline_id)
        DO UPDATE SET stage_id = EXCLUDED.stage_id, moved_at = EXCLUDED.moved_at
        RETURNING id, order_id, pipeline_id, stage_id, moved_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(pipeline_id)
    .bind(stage_id)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Create a card for an order unless the order already has one.
///
/// Returns `None` when a card existed; the existing card keeps its stage.
pub async fn insert_if_absent(
    executor: impl PgExecutor<'_>,
    order_id: Uuid,
    pipeline_id: Uuid,
    stage_id: Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Option<Card>, sqlx::Error> {
    let row = sqlx::query_as::<_, CardRow>(
        r#"
        INSERT INTO cards (id, order_id, pipeline_id, stage_id, moved_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (order_id, pipeline_id) DO NOTHING
        RETURNING id, order_id, pipeline_id, stage_id, moved_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(pipeline_id)
    .bind(stage_id)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find an order's card within a pipeline
pub async fn find_by_order(
    executor: impl PgExecutor<'_>,
    order_id: Uuid,
    pipeline_id: Uuid,
) -> Result<Option<Card>, sqlx::Error> {
    let row = sqlx::query_as::<_, CardRow>(
        r#"
        SELECT id, order_id, pipeline_id, stage_id, moved_at
        FROM cards
        WHERE order_id = $1 AND pipeline_id = $2
        "#,
    )
    .bind(order_id)
    .bind(pipeline_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List a pipeline's cards, most recently moved first
pub async fn list_by_pipeline(
    executor: impl PgExecutor<'_>,
    pipeline_id: Uuid,
) -> Result<Vec<Card>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CardRow>(
        r#"
        SELECT id, order_id, pipeline_id, stage_id, moved_at
        FROM cards
        WHERE pipeline_id = $1
        ORDER BY moved_at DESC
        "#,
    )
    .bind(pipeline_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Count the cards currently assigned to a stage
pub async fn count_by_stage(
    executor: impl PgExecutor<'_>,
    stage_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE stage_id = $1")
        .bind(stage_id)
        .fetch_one(executor)
        .await
}

/// Count the cards currently assigned anywhere in a pipeline
pub async fn count_by_pipeline(
    executor: impl PgExecutor<'_>,
    pipeline_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE pipeline_id = $1")
        .bind(pipeline_id)
        .fetch_one(executor)
        .await
}

/// Remove an order's card from a pipeline
pub async fn delete_by_order(
    executor: impl PgExecutor<'_>,
    order_id: Uuid,
    pipeline_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cards WHERE order_id = $1 AND pipeline_id = $2")
        .bind(order_id)
        .bind(pipeline_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CardRow {
    id: Uuid,
    order_id: Uuid,
    pipeline_id: Uuid,
    stage_id: Uuid,
    moved_at: chrono::DateTime<chrono::Utc>,
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Card {
            id: row.id,
            order_id: row.order_id,
            pipeline_id: row.pipeline_id,
            stage_id: row.stage_id,
            moved_at: row.moved_at,
        }
    }
}
