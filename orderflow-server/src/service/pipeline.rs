//! Pipeline Service
//!
//! Business logic for pipeline management: creation with the reserved stage
//! set, the one-default-per-profile invariant, and the deletion protections.

use orderflow_core::domain::pipeline::Pipeline;
use orderflow_core::domain::principal::Principal;
use orderflow_core::domain::stage::{Stage, StageKind, SystemStatus};
use orderflow_core::dto::pipeline::{
    CreatePipeline, PipelineDetail, PipelineSummary, UpdatePipeline,
};
use orderflow_core::position;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{card_repository, pipeline_repository, stage_repository};
use crate::service::{Error, Result, authorize, is_unique_violation};

/// Create a new pipeline with its four reserved stages.
///
/// The profile's first pipeline becomes the default. A racing first-create
/// loses against the partial unique index and surfaces as a conflict.
pub async fn create_pipeline(
    pool: &PgPool,
    principal: &Principal,
    req: CreatePipeline,
) -> Result<Pipeline> {
    validate_pipeline_name(&req.name)?;

    let now = chrono::Utc::now();
    let mut tx = pool.begin().await?;

    let existing = pipeline_repository::list_by_profile(&mut *tx, req.profile_id).await?;
    if let Some(first) = existing.first() {
        // The profile's pipelines all share one owner; adding to someone
        // else's profile requires admin.
        authorize(principal, first)?;
    }

    // An admin creating on a provisioned profile keeps the profile's owner
    let owner_user_id = existing
        .first()
        .map(|p| p.owner_user_id)
        .unwrap_or(principal.id);

    let pipeline = Pipeline {
        id: Uuid::new_v4(),
        profile_id: req.profile_id,
        owner_user_id,
        name: req.name.trim().to_string(),
        description: req.description.clone(),
        settings: Default::default(),
        is_default: existing.is_empty(),
        created_at: now,
        updated_at: now,
    };

    pipeline_repository::insert(&mut *tx, &pipeline)
        .await
        .map_err(classify_default_race)?;

    // Reserved stages in their fixed relative order, evenly spaced
    let positions = position::renumbered(SystemStatus::ALL.len());
    for (status, pos) in SystemStatus::ALL.into_iter().zip(positions) {
        let stage = Stage {
            id: Uuid::new_v4(),
            pipeline_id: pipeline.id,
            name: status.default_label().to_string(),
            position: pos,
            kind: StageKind::Reserved(status),
            created_at: now,
            updated_at: now,
        };
        stage_repository::insert(&mut *tx, &stage).await?;
    }

    tx.commit().await.map_err(classify_default_race)?;

    tracing::info!("Pipeline created: {} ({})", pipeline.name, pipeline.id);

    Ok(pipeline)
}

/// Get a pipeline with its ordered stages
pub async fn get_pipeline(pool: &PgPool, principal: &Principal, id: Uuid) -> Result<PipelineDetail> {
    let pipeline = pipeline_repository::find_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", id))?;
    authorize(principal, &pipeline)?;

    let stages = stage_repository::list_by_pipeline(pool, id).await?;

    Ok(PipelineDetail {
        pipeline,
        stages: stages.into_iter().map(Into::into).collect(),
    })
}

/// List a profile's pipelines
pub async fn list_pipelines(
    pool: &PgPool,
    principal: &Principal,
    profile_id: Uuid,
) -> Result<Vec<PipelineSummary>> {
    let pipelines = pipeline_repository::list_by_profile(pool, profile_id).await?;
    if let Some(first) = pipelines.first() {
        authorize(principal, first)?;
    }

    Ok(pipelines.into_iter().map(Into::into).collect())
}

/// Update a pipeline's name, description or display settings
pub async fn update_pipeline(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
    patch: UpdatePipeline,
) -> Result<Pipeline> {
    validate_pipeline_patch(&patch)?;

    let mut pipeline = pipeline_repository::find_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", id))?;
    authorize(principal, &pipeline)?;

    if let Some(name) = patch.name {
        pipeline.name = name.trim().to_string();
    }
    if let Some(description) = patch.description {
        pipeline.description = Some(description);
    }
    if let Some(settings) = patch.settings {
        pipeline.settings = settings;
    }
    pipeline.updated_at = chrono::Utc::now();

    let updated = pipeline_repository::update(pool, &pipeline).await?;
    if !updated {
        return Err(Error::not_found("pipeline", id));
    }

    tracing::info!("Pipeline updated: {}", id);

    Ok(pipeline)
}

/// Make a pipeline its profile's default.
///
/// The previous default is flipped off in the same transaction; there is
/// never a moment with zero or two defaults.
pub async fn set_default_pipeline(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
) -> Result<Pipeline> {
    let now = chrono::Utc::now();
    let mut tx = pool.begin().await?;

    let mut pipeline = pipeline_repository::lock_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", id))?;
    authorize(principal, &pipeline)?;

    if !pipeline.is_default {
        pipeline_repository::clear_default_for_profile(&mut *tx, pipeline.profile_id, now).await?;
        pipeline_repository::mark_default(&mut *tx, id, now).await?;
        pipeline.is_default = true;
        pipeline.updated_at = now;
    }

    tx.commit().await?;

    tracing::info!(
        "Pipeline {} set as default for profile {}",
        id,
        pipeline.profile_id
    );

    Ok(pipeline)
}

/// Delete a pipeline.
///
/// Refused while it is the default or while any order still has a card on
/// one of its stages; stages are removed by cascade.
pub async fn delete_pipeline(pool: &PgPool, principal: &Principal, id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;

    let pipeline = pipeline_repository::lock_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", id))?;
    authorize(principal, &pipeline)?;

    let cards = card_repository::count_by_pipeline(&mut *tx, id).await?;
    ensure_pipeline_deletable(&pipeline, cards)?;

    pipeline_repository::delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!("Pipeline deleted: {}", id);

    Ok(())
}

fn ensure_pipeline_deletable(pipeline: &Pipeline, cards: i64) -> Result<()> {
    if pipeline.is_default {
        return Err(Error::conflict("the default pipeline cannot be deleted"));
    }

    if cards > 0 {
        return Err(Error::conflict(format!(
            "pipeline still has {cards} assigned orders; move or archive them first"
        )));
    }

    Ok(())
}

fn classify_default_race(err: sqlx::Error) -> Error {
    if is_unique_violation(&err) {
        Error::conflict("another pipeline was created for this profile concurrently")
    } else {
        err.into()
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_pipeline_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Pipeline name cannot be empty"));
    }

    if name.len() > 255 {
        return Err(Error::validation(
            "Pipeline name is too long (max 255 characters)",
        ));
    }

    Ok(())
}

fn validate_pipeline_patch(patch: &UpdatePipeline) -> Result<()> {
    if patch.is_empty() {
        return Err(Error::validation(
            "Patch must set at least one of name, description, settings",
        ));
    }

    if let Some(name) = &patch.name {
        validate_pipeline_name(name)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(is_default: bool) -> Pipeline {
        let now = chrono::Utc::now();
        Pipeline {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            name: "Sales".to_string(),
            description: None,
            settings: Default::default(),
            is_default,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_default_pipeline_never_deletable() {
        assert!(matches!(
            ensure_pipeline_deletable(&pipeline(true), 0),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_pipeline_with_cards_not_deletable() {
        assert!(matches!(
            ensure_pipeline_deletable(&pipeline(false), 3),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_empty_non_default_pipeline_deletable() {
        assert!(ensure_pipeline_deletable(&pipeline(false), 0).is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        assert!(matches!(
            validate_pipeline_name(""),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_pipeline_name("   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_long_name() {
        let name = "x".repeat(256);
        assert!(matches!(
            validate_pipeline_name(&name),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_valid_name() {
        assert!(validate_pipeline_name("Sales").is_ok());
    }

    #[test]
    fn test_validate_empty_patch() {
        assert!(matches!(
            validate_pipeline_patch(&UpdatePipeline::default()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_patch_with_empty_name() {
        let patch = UpdatePipeline {
            name: Some("".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_pipeline_patch(&patch),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_patch_settings_only() {
        let patch = UpdatePipeline {
            settings: Some(Default::default()),
            ..Default::default()
        };
        assert!(validate_pipeline_patch(&patch).is_ok());
    }
}
