//! Stage DTOs

use crate::domain::stage::{ClientStatus, Stage, SystemStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a custom stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStage {
    pub name: String,
    /// Stage the new one goes immediately after. `None` appends at the end
    /// of the customizable region (just before the confirmed stage).
    pub after: Option<Uuid>,
}

/// Patch for a stage: rename, reorder, or both
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStage {
    pub name: Option<String>,
    pub reorder: Option<ReorderTarget>,
}

/// Where a reordered stage should land
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderTarget {
    /// Stage to move after. `None` moves to the end of the customizable
    /// region.
    pub after: Option<Uuid>,
}

/// Stage as served on read paths, with the derived client status attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageView {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    pub position: i64,
    pub system_status: Option<SystemStatus>,
    pub client_status: ClientStatus,
}

impl From<Stage> for StageView {
    fn from(stage: Stage) -> Self {
        let client_status = stage.client_status();
        Self {
            id: stage.id,
            pipeline_id: stage.pipeline_id,
            name: stage.name,
            position: stage.position,
            system_status: stage.kind.into(),
            client_status,
        }
    }
}
