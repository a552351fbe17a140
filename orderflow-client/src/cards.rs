//! Card-related API endpoints

use crate::EngineClient;
use crate::error::Result;
use orderflow_core::domain::principal::Principal;
use orderflow_core::dto::card::{CardView, EnterPipeline, MoveCard, OrderStatus};
use reqwest::Method;
use uuid::Uuid;

impl EngineClient {
    // =============================================================================
    // Card Assignments
    // =============================================================================

    /// List a pipeline's card assignments for board rendering
    pub async fn list_cards(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
    ) -> Result<Vec<CardView>> {
        let response = self
            .request(
                Method::GET,
                &format!("/pipeline/{}/cards", pipeline_id),
                principal,
            )
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Enter an order into a pipeline on its pending stage
    pub async fn enter_pipeline(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
        order_id: Uuid,
    ) -> Result<CardView> {
        let response = self
            .request(
                Method::POST,
                &format!("/pipeline/{}/cards", pipeline_id),
                principal,
            )
            .json(&EnterPipeline { order_id })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Move an order's card to a target stage
    pub async fn move_card(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
        order_id: Uuid,
        stage_id: Uuid,
    ) -> Result<CardView> {
        let response = self
            .request(
                Method::POST,
                &format!("/pipeline/{}/cards/{}/move", pipeline_id, order_id),
                principal,
            )
            .json(&MoveCard { stage_id })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the simplified client-facing status of an order
    pub async fn order_status(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderStatus> {
        let response = self
            .request(
                Method::GET,
                &format!("/pipeline/{}/cards/{}/status", pipeline_id, order_id),
                principal,
            )
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Remove an order's card from a pipeline
    pub async fn remove_card(
        &self,
        principal: &Principal,
        pipeline_id: Uuid,
        order_id: Uuid,
    ) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/pipeline/{}/cards/{}", pipeline_id, order_id),
                principal,
            )
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
