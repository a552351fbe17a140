//! Pipeline DTOs

use crate::domain::pipeline::Pipeline;
use crate::dto::stage::StageView;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Request to create a new pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipeline {
    pub profile_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Patch for a pipeline's editable attributes.
///
/// `is_default` is deliberately absent: default status only changes through
/// the explicit set-default operation. Unknown fields are rejected so an
/// attempt to patch it fails loudly instead of being silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePipeline {
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<HashMap<String, serde_json::Value>>,
}

impl UpdatePipeline {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.settings.is_none()
    }
}

/// Compact pipeline representation for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Pipeline> for PipelineSummary {
    fn from(pipeline: Pipeline) -> Self {
        Self {
            id: pipeline.id,
            profile_id: pipeline.profile_id,
            name: pipeline.name,
            is_default: pipeline.is_default,
            created_at: pipeline.created_at,
        }
    }
}

/// Pipeline with its ordered stages, as served by `GET /pipeline/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDetail {
    #[serde(flatten)]
    pub pipeline: Pipeline,
    /// Stages in display order, each carrying its client-visible status
    pub stages: Vec<StageView>,
}
