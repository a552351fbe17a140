//! Pipeline-related API endpoints

use crate::EngineClient;
use crate::error::Result;
use orderflow_core::domain::pipeline::Pipeline;
use orderflow_core::domain::principal::Principal;
use orderflow_core::dto::pipeline::{
    CreatePipeline, PipelineDetail, PipelineSummary, UpdatePipeline,
};
use reqwest::Method;
use uuid::Uuid;

impl EngineClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// Create a new pipeline with its reserved stages
    ///
    /// # Arguments
    /// * `principal` - The caller the request is made on behalf of
    /// * `req` - The pipeline creation request
    ///
    /// # Returns
    /// The created pipeline
    pub async fn create_pipeline(
        &self,
        principal: &Principal,
        req: CreatePipeline,
    ) -> Result<Pipeline> {
        let response = self
            .request(Method::POST, "/pipeline/create", principal)
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List a profile's pipelines
    pub async fn list_pipelines(
        &self,
        principal: &Principal,
        profile_id: Uuid,
    ) -> Result<Vec<PipelineSummary>> {
        let response = self
            .request(
                Method::GET,
                &format!("/pipeline/list/{}", profile_id),
                principal,
            )
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a pipeline with its ordered stages and client statuses
    pub async fn get_pipeline(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
    ) -> Result<PipelineDetail> {
        let response = self
            .request(Method::GET, &format!("/pipeline/{}", pipeline_id), principal)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Update a pipeline's name, description or display settings
    pub async fn update_pipeline(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
        patch: UpdatePipeline,
    ) -> Result<Pipeline> {
        let response = self
            .request(
                Method::PATCH,
                &format!("/pipeline/{}", pipeline_id),
                principal,
            )
            .json(&patch)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Make a pipeline its profile's default
    pub async fn set_default_pipeline(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
    ) -> Result<Pipeline> {
        let response = self
            .request(
                Method::POST,
                &format!("/pipeline/{}/default", pipeline_id),
                principal,
            )
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a non-default pipeline that has no assigned cards
    pub async fn delete_pipeline(&self, principal: &Principal, pipeline_id: Uuid) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/pipeline/{}", pipeline_id),
                principal,
            )
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
