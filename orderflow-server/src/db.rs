use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create pipelines table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipelines (
            id UUID PRIMARY KEY,
            profile_id UUID NOT NULL,
            owner_user_id UUID NOT NULL,
            name VARCHAR(255) NOT NULL,
            description TEXT,
            settings JSONB NOT NULL DEFAULT '{}',
            is_default BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create stages table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stages (
            id UUID PRIMARY KEY,
            pipeline_id UUID NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
            name VARCHAR(255) NOT NULL,
            position BIGINT NOT NULL,
            system_status VARCHAR(20),
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create cards table. The stage reference has no cascade: stage and
    // pipeline deletion is blocked while cards exist, and the foreign key
    // backs that rule at the storage level.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cards (
            id UUID PRIMARY KEY,
            order_id UUID NOT NULL,
            pipeline_id UUID NOT NULL REFERENCES pipelines(id),
            stage_id UUID NOT NULL REFERENCES stages(id),
            moved_at TIMESTAMPTZ NOT NULL,
            UNIQUE (order_id, pipeline_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Invariant-bearing indexes: one default pipeline per profile, distinct
    // positions within a pipeline, at most one stage per reserved semantic.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_pipelines_one_default
         ON pipelines(profile_id) WHERE is_default",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_stages_pipeline_position
         ON stages(pipeline_id, position)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_stages_pipeline_system_status
         ON stages(pipeline_id, system_status) WHERE system_status IS NOT NULL",
    )
    .execute(pool)
    .await?;

    // Indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pipelines_profile_id ON pipelines(profile_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_stages_pipeline_id ON stages(pipeline_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cards_stage_id ON cards(stage_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cards_pipeline_id ON cards(pipeline_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
