//! Stage Repository
//!
//! Handles all database operations related to stages.

use orderflow_core::domain::stage::{Stage, StageKind, SystemStatus};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

/// Insert a new stage
pub async fn insert(executor: impl PgExecutor<'_>, stage: &Stage) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stages (id, pipeline_id, name, position, system_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(stage.id)
    .bind(stage.pipeline_id)
    .bind(&stage.name)
    .bind(stage.position)
    .bind(stage.system_status().map(SystemStatus::as_str))
    .bind(stage.created_at)
    .bind(stage.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Find a stage by ID
pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<Stage>, sqlx::Error> {
    let row = sqlx::query_as::<_, StageRow>(
        r#"
        SELECT id, pipeline_id, name, position, system_status, created_at, updated_at
        FROM stages
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List a pipeline's stages in display order
pub async fn list_by_pipeline(
    executor: impl PgExecutor<'_>,
    pipeline_id: Uuid,
) -> Result<Vec<Stage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StageRow>(
        r#"
        SELECT id, pipeline_id, name, position, system_status, created_at, updated_at
        FROM stages
        WHERE pipeline_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(pipeline_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Write a stage's mutable attributes (name, position).
///
/// `system_status` is deliberately not part of the statement: reserved
/// semantics never change after creation.
pub async fn update(executor: impl PgExecutor<'_>, stage: &Stage) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE stages
        SET name = $1, position = $2, updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(&stage.name)
    .bind(stage.position)
    .bind(stage.updated_at)
    .bind(stage.id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Rewrite every stage position of a pipeline in one transaction.
///
/// The position unique index is checked per row, so the old positions are
/// parked in negative space first; the assignments then land without
/// transient collisions.
pub async fn renumber(
    conn: &mut PgConnection,
    pipeline_id: Uuid,
    assignments: &[(Uuid, i64)],
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE stages SET position = -position - 1 WHERE pipeline_id = $1")
        .bind(pipeline_id)
        .execute(&mut *conn)
        .await?;

    for (stage_id, position) in assignments {
        sqlx::query("UPDATE stages SET position = $1, updated_at = $2 WHERE id = $3")
            .bind(position)
            .bind(now)
            .bind(stage_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Delete a stage by ID
pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stages WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct StageRow {
    id: Uuid,
    pipeline_id: Uuid,
    name: String,
    position: i64,
    system_status: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<StageRow> for Stage {
    fn from(row: StageRow) -> Self {
        // An unrecognized status value degrades to a custom stage rather
        // than failing the whole read.
        let kind = StageKind::from(row.system_status.as_deref().and_then(SystemStatus::parse));

        Stage {
            id: row.id,
            pipeline_id: row.pipeline_id,
            name: row.name,
            position: row.position,
            kind,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
