//! Pipeline Repository
//!
//! Handles all database operations related to pipelines.

use orderflow_core::domain::pipeline::Pipeline;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

/// Insert a new pipeline
pub async fn insert(executor: impl PgExecutor<'_>, pipeline: &Pipeline) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pipelines (
            id, profile_id, owner_user_id, name, description,
            settings, is_default, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(pipeline.id)
    .bind(pipeline.profile_id)
    .bind(pipeline.owner_user_id)
    .bind(&pipeline.name)
    .bind(&pipeline.description)
    .bind(serde_json::to_value(&pipeline.settings).unwrap())
    .bind(pipeline.is_default)
    .bind(pipeline.created_at)
    .bind(pipeline.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Find a pipeline by ID
pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<Pipeline>, sqlx::Error> {
    let row = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, profile_id, owner_user_id, name, description,
               settings, is_default, created_at, updated_at
        FROM pipelines
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find a pipeline by ID and lock its row for the current transaction.
///
/// Every multi-row mutation of a pipeline's stage set takes this lock first,
/// which serializes concurrent inserts and reorders per pipeline.
pub async fn lock_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Pipeline>, sqlx::Error> {
    let row = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, profile_id, owner_user_id, name, description,
               settings, is_default, created_at, updated_at
        FROM pipelines
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List a profile's pipelines
pub async fn list_by_profile(
    executor: impl PgExecutor<'_>,
    profile_id: Uuid,
) -> Result<Vec<Pipeline>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, profile_id, owner_user_id, name, description,
               settings, is_default, created_at, updated_at
        FROM pipelines
        WHERE profile_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(profile_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Whether a profile already owns at least one pipeline
pub async fn profile_has_pipeline(
    executor: impl PgExecutor<'_>,
    profile_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pipelines WHERE profile_id = $1)")
        .bind(profile_id)
        .fetch_one(executor)
        .await
}

/// Write a pipeline's editable attributes (name, description, settings)
pub async fn update(
    executor: impl PgExecutor<'_>,
    pipeline: &Pipeline,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipelines
        SET name = $1, description = $2, settings = $3, updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(&pipeline.name)
    .bind(&pipeline.description)
    .bind(serde_json::to_value(&pipeline.settings).unwrap())
    .bind(pipeline.updated_at)
    .bind(pipeline.id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Clear the default flag on a profile's current default pipeline
pub async fn clear_default_for_profile(
    executor: impl PgExecutor<'_>,
    profile_id: Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pipelines
        SET is_default = FALSE, updated_at = $1
        WHERE profile_id = $2 AND is_default
        "#,
    )
    .bind(now)
    .bind(profile_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Mark a pipeline as its profile's default
pub async fn mark_default(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pipelines
        SET is_default = TRUE, updated_at = $1
        WHERE id = $2
        "#,
    )
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Delete a pipeline by ID
pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: Uuid,
    profile_id: Uuid,
    owner_user_id: Uuid,
    name: String,
    description: Option<String>,
    settings: serde_json::Value,
    is_default: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PipelineRow> for Pipeline {
    fn from(row: PipelineRow) -> Self {
        let settings = serde_json::from_value(row.settings).unwrap_or_default();

        Pipeline {
            id: row.id,
            profile_id: row.profile_id,
            owner_user_id: row.owner_user_id,
            name: row.name,
            description: row.description,
            settings,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
