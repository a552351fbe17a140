//! Stage-related API endpoints

use crate::EngineClient;
use crate::error::Result;
use orderflow_core::domain::principal::Principal;
use orderflow_core::dto::stage::{CreateStage, StageView, UpdateStage};
use reqwest::Method;
use uuid::Uuid;

impl EngineClient {
    // =============================================================================
    // Stage Management
    // =============================================================================

    /// Create a custom stage within the pipeline's customizable region
    pub async fn create_stage(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
        req: CreateStage,
    ) -> Result<StageView> {
        let response = self
            .request(
                Method::POST,
                &format!("/pipeline/{}/stages", pipeline_id),
                principal,
            )
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Rename and/or reorder a stage
    pub async fn update_stage(
        &self,
        principal: &Principal,
        stage_id: Uuid,
        patch: UpdateStage,
    ) -> Result<StageView> {
        let response = self
            .request(Method::PATCH, &format!("/stage/{}", stage_id), principal)
            .json(&patch)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a custom stage that has no assigned cards
    pub async fn delete_stage(&self, principal: &Principal, stage_id: Uuid) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/stage/{}", stage_id), principal)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
