//! Stage Service
//!
//! Business logic for stage management: the insertion-region rule, position
//! allocation with transparent renumbering, and the reserved-stage
//! protections.

use orderflow_core::domain::principal::Principal;
use orderflow_core::domain::stage::{Stage, StageKind, SystemStatus};
use orderflow_core::dto::stage::{CreateStage, ReorderTarget, UpdateStage};
use orderflow_core::position;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{card_repository, pipeline_repository, stage_repository};
use crate::service::{Error, Result, authorize, is_unique_violation};

/// Bounded retries for a position taken by a concurrent writer. The
/// pipeline row lock makes this nearly unreachable; exhausting it is a
/// logic bug and surfaces as a conflict.
const MAX_POSITION_ATTEMPTS: usize = 3;

/// Create a custom stage.
///
/// `req.after` must point at the pending stage or another custom stage;
/// `None` appends at the end of the customizable region. Position allocation
/// renumbers the pipeline transparently when the gap is exhausted.
pub async fn create_stage(
    pool: &PgPool,
    principal: &Principal,
    pipeline_id: Uuid,
    req: CreateStage,
) -> Result<Stage> {
    validate_stage_name(&req.name)?;

    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut tx = pool.begin().await?;

        let pipeline = pipeline_repository::lock_by_id(&mut tx, pipeline_id)
            .await?
            .ok_or_else(|| Error::not_found("pipeline", pipeline_id))?;
        authorize(principal, &pipeline)?;

        let stages = stage_repository::list_by_pipeline(&mut *tx, pipeline_id).await?;
        let prev_index = insertion_index(&stages, req.after)?;
        let (prev, next) = neighbor_positions(&stages, prev_index)?;
        let now = chrono::Utc::now();

        let position = match position::allocate(Some(prev), Some(next)) {
            Ok(position) => position,
            Err(position::PositionExhausted) => {
                tracing::debug!(
                    "Renumbering stages of pipeline {} after position exhaustion",
                    pipeline_id
                );
                let fresh = position::renumbered(stages.len());
                let assignments: Vec<(Uuid, i64)> = stages
                    .iter()
                    .map(|s| s.id)
                    .zip(fresh.iter().copied())
                    .collect();
                stage_repository::renumber(&mut tx, pipeline_id, &assignments, now).await?;
                position::allocate(Some(fresh[prev_index]), Some(fresh[prev_index + 1]))
                    .map_err(|_| Error::conflict("no stage position available after renumbering"))?
            }
        };

        let stage = Stage {
            id: Uuid::new_v4(),
            pipeline_id,
            name: req.name.trim().to_string(),
            position,
            kind: StageKind::Custom,
            created_at: now,
            updated_at: now,
        };

        match stage_repository::insert(&mut *tx, &stage).await {
            Ok(()) => {
                tx.commit().await?;
                tracing::info!(
                    "Stage created: {} ({}) in pipeline {}",
                    stage.name,
                    stage.id,
                    pipeline_id
                );
                return Ok(stage);
            }
            Err(err) if is_unique_violation(&err) && attempt < MAX_POSITION_ATTEMPTS => {
                tracing::warn!(
                    "Stage position {} in pipeline {} taken concurrently; retrying",
                    position,
                    pipeline_id
                );
                continue;
            }
            Err(err) if is_unique_violation(&err) => {
                return Err(Error::conflict(
                    "could not allocate a stage position; too many concurrent changes",
                ));
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Rename and/or reorder a stage.
///
/// Reserved stages can be renamed but keep their fixed relative order; only
/// custom stages move, and only within the customizable region.
pub async fn update_stage(
    pool: &PgPool,
    principal: &Principal,
    stage_id: Uuid,
    patch: UpdateStage,
) -> Result<Stage> {
    validate_stage_patch(&patch)?;

    // Resolve the owning pipeline first; the transaction below re-reads the
    // stage under the pipeline lock.
    let probe = stage_repository::find_by_id(pool, stage_id)
        .await?
        .ok_or_else(|| Error::not_found("stage", stage_id))?;
    let pipeline_id = probe.pipeline_id;

    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut tx = pool.begin().await?;

        let pipeline = pipeline_repository::lock_by_id(&mut tx, pipeline_id)
            .await?
            .ok_or_else(|| Error::not_found("pipeline", pipeline_id))?;
        authorize(principal, &pipeline)?;

        let stages = stage_repository::list_by_pipeline(&mut *tx, pipeline_id).await?;
        let mut stage = stages
            .iter()
            .find(|s| s.id == stage_id)
            .cloned()
            .ok_or_else(|| Error::not_found("stage", stage_id))?;

        let now = chrono::Utc::now();
        if let Some(name) = &patch.name {
            stage.name = name.trim().to_string();
        }
        stage.updated_at = now;

        if let Some(target) = &patch.reorder {
            validate_reorder(&stage, target)?;

            // Neighbors are computed over the pipeline without the moving
            // stage.
            let remaining: Vec<Stage> = stages
                .iter()
                .filter(|s| s.id != stage_id)
                .cloned()
                .collect();
            let prev_index = insertion_index(&remaining, target.after)?;
            let (prev, next) = neighbor_positions(&remaining, prev_index)?;

            match position::allocate(Some(prev), Some(next)) {
                Ok(position) => stage.position = position,
                Err(position::PositionExhausted) => {
                    // Renumber the pipeline in its post-move order; the
                    // moving stage takes its slot straight from the fresh
                    // layout.
                    tracing::debug!(
                        "Renumbering stages of pipeline {} after position exhaustion",
                        pipeline_id
                    );
                    let fresh = position::renumbered(stages.len());
                    let mut order: Vec<Uuid> = remaining.iter().map(|s| s.id).collect();
                    order.insert(prev_index + 1, stage_id);
                    let assignments: Vec<(Uuid, i64)> =
                        order.into_iter().zip(fresh.iter().copied()).collect();
                    stage_repository::renumber(&mut tx, pipeline_id, &assignments, now).await?;
                    stage.position = fresh[prev_index + 1];
                }
            }
        }

        match stage_repository::update(&mut *tx, &stage).await {
            Ok(true) => {
                tx.commit().await?;
                tracing::info!("Stage updated: {}", stage_id);
                return Ok(stage);
            }
            Ok(false) => return Err(Error::not_found("stage", stage_id)),
            Err(err) if is_unique_violation(&err) && attempt < MAX_POSITION_ATTEMPTS => {
                tracing::warn!(
                    "Stage position collision in pipeline {}; retrying",
                    pipeline_id
                );
                continue;
            }
            Err(err) if is_unique_violation(&err) => {
                return Err(Error::conflict(
                    "could not place the stage; too many concurrent changes",
                ));
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Delete a custom stage.
///
/// Reserved stages are never deletable; a custom stage must be empty of
/// cards first.
pub async fn delete_stage(pool: &PgPool, principal: &Principal, stage_id: Uuid) -> Result<()> {
    let probe = stage_repository::find_by_id(pool, stage_id)
        .await?
        .ok_or_else(|| Error::not_found("stage", stage_id))?;

    let mut tx = pool.begin().await?;

    let pipeline = pipeline_repository::lock_by_id(&mut tx, probe.pipeline_id)
        .await?
        .ok_or_else(|| Error::not_found("pipeline", probe.pipeline_id))?;
    authorize(principal, &pipeline)?;

    let stage = stage_repository::find_by_id(&mut *tx, stage_id)
        .await?
        .ok_or_else(|| Error::not_found("stage", stage_id))?;

    let cards = card_repository::count_by_stage(&mut *tx, stage_id).await?;
    ensure_stage_deletable(&stage, cards)?;

    stage_repository::delete(&mut *tx, stage_id).await?;
    tx.commit().await?;

    tracing::info!("Stage deleted: {}", stage_id);

    Ok(())
}

// =============================================================================
// Placement rules
// =============================================================================

/// Index of the stage a custom stage goes immediately after.
///
/// Custom stages live in the triage region between `pending` and
/// `confirmed`: insertion is legal only after `pending` or after another
/// custom stage. `after = None` appends at the end of the region, just
/// before `confirmed`. `stages` must be in position order.
fn insertion_index(stages: &[Stage], after: Option<Uuid>) -> Result<usize> {
    match after {
        None => {
            let confirmed = stages
                .iter()
                .position(|s| s.system_status() == Some(SystemStatus::Confirmed))
                .ok_or_else(|| Error::conflict("pipeline has no confirmed stage"))?;
            confirmed
                .checked_sub(1)
                .ok_or_else(|| Error::conflict("pipeline has no stage before confirmed"))
        }
        Some(after_id) => {
            let index = stages
                .iter()
                .position(|s| s.id == after_id)
                .ok_or_else(|| Error::not_found("stage", after_id))?;
            match stages[index].kind {
                StageKind::Custom | StageKind::Reserved(SystemStatus::Pending) => Ok(index),
                StageKind::Reserved(_) => Err(Error::validation(
                    "custom stages can only be inserted after the pending stage or another custom stage",
                )),
            }
        }
    }
}

/// Positions of the neighbor pair a new position goes between
fn neighbor_positions(stages: &[Stage], prev_index: usize) -> Result<(i64, i64)> {
    let prev = &stages[prev_index];
    let next = stages
        .get(prev_index + 1)
        .ok_or_else(|| Error::conflict("pipeline stage ordering is malformed"))?;
    Ok((prev.position, next.position))
}

fn ensure_stage_deletable(stage: &Stage, cards: i64) -> Result<()> {
    if stage.is_reserved() {
        return Err(Error::validation("reserved stages cannot be deleted"));
    }

    if cards > 0 {
        return Err(Error::conflict(format!(
            "stage still has {cards} assigned orders; move them first"
        )));
    }

    Ok(())
}

fn validate_reorder(stage: &Stage, target: &ReorderTarget) -> Result<()> {
    if stage.is_reserved() {
        return Err(Error::validation(
            "reserved stages keep their fixed order and cannot be reordered",
        ));
    }

    if target.after == Some(stage.id) {
        return Err(Error::validation("a stage cannot be moved after itself"));
    }

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_stage_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Stage name cannot be empty"));
    }

    if name.len() > 255 {
        return Err(Error::validation(
            "Stage name is too long (max 255 characters)",
        ));
    }

    Ok(())
}

fn validate_stage_patch(patch: &UpdateStage) -> Result<()> {
    if patch.name.is_none() && patch.reorder.is_none() {
        return Err(Error::validation("Patch must set name or reorder"));
    }

    if let Some(name) = &patch.name {
        validate_stage_name(name)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved(status: SystemStatus, position: i64) -> Stage {
        let now = chrono::Utc::now();
        Stage {
            id: Uuid::new_v4(),
            pipeline_id: Uuid::new_v4(),
            name: status.default_label().to_string(),
            position,
            kind: StageKind::Reserved(status),
            created_at: now,
            updated_at: now,
        }
    }

    fn custom(name: &str, position: i64) -> Stage {
        let now = chrono::Utc::now();
        Stage {
            id: Uuid::new_v4(),
            pipeline_id: Uuid::new_v4(),
            name: name.to_string(),
            position,
            kind: StageKind::Custom,
            created_at: now,
            updated_at: now,
        }
    }

    fn fresh_pipeline() -> Vec<Stage> {
        vec![
            reserved(SystemStatus::Pending, 10),
            reserved(SystemStatus::Confirmed, 20),
            reserved(SystemStatus::Completed, 30),
            reserved(SystemStatus::Cancelled, 40),
        ]
    }

    #[test]
    fn test_insertion_after_pending() {
        let stages = fresh_pipeline();
        assert_eq!(insertion_index(&stages, Some(stages[0].id)).unwrap(), 0);
    }

    #[test]
    fn test_insertion_after_custom() {
        let mut stages = fresh_pipeline();
        stages.insert(1, custom("Qualifying", 15));
        assert_eq!(insertion_index(&stages, Some(stages[1].id)).unwrap(), 1);
    }

    #[test]
    fn test_insertion_after_terminal_reserved_rejected() {
        let stages = fresh_pipeline();
        // confirmed, completed, cancelled are all off limits
        for index in 1..4 {
            assert!(matches!(
                insertion_index(&stages, Some(stages[index].id)),
                Err(Error::Validation(_))
            ));
        }
    }

    #[test]
    fn test_insertion_after_unknown_stage() {
        let stages = fresh_pipeline();
        assert!(matches!(
            insertion_index(&stages, Some(Uuid::new_v4())),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_insertion_default_appends_to_region_end() {
        let mut stages = fresh_pipeline();
        // Empty region: lands right after pending
        assert_eq!(insertion_index(&stages, None).unwrap(), 0);

        // With custom stages, lands after the last one before confirmed
        stages.insert(1, custom("Qualifying", 12));
        stages.insert(2, custom("Quoted", 15));
        assert_eq!(insertion_index(&stages, None).unwrap(), 2);
    }

    #[test]
    fn test_neighbor_positions() {
        let stages = fresh_pipeline();
        assert_eq!(neighbor_positions(&stages, 0).unwrap(), (10, 20));
        assert!(neighbor_positions(&stages, 3).is_err());
    }

    #[test]
    fn test_validate_reorder_reserved_rejected() {
        let stage = reserved(SystemStatus::Pending, 10);
        assert!(matches!(
            validate_reorder(&stage, &ReorderTarget { after: None }),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_reorder_self_rejected() {
        let stage = custom("Qualifying", 15);
        let target = ReorderTarget {
            after: Some(stage.id),
        };
        assert!(matches!(
            validate_reorder(&stage, &target),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_reorder_custom_ok() {
        let stage = custom("Qualifying", 15);
        assert!(validate_reorder(&stage, &ReorderTarget { after: None }).is_ok());
    }

    #[test]
    fn test_reserved_stage_never_deletable() {
        for status in SystemStatus::ALL {
            assert!(matches!(
                ensure_stage_deletable(&reserved(status, 10), 0),
                Err(Error::Validation(_))
            ));
        }
    }

    #[test]
    fn test_custom_stage_with_cards_not_deletable() {
        assert!(matches!(
            ensure_stage_deletable(&custom("Qualifying", 15), 1),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_empty_custom_stage_deletable() {
        assert!(ensure_stage_deletable(&custom("Qualifying", 15), 0).is_ok());
    }

    #[test]
    fn test_validate_stage_patch_requires_change() {
        assert!(matches!(
            validate_stage_patch(&UpdateStage::default()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_stage_name_empty() {
        assert!(matches!(
            validate_stage_name("  "),
            Err(Error::Validation(_))
        ));
    }
}
