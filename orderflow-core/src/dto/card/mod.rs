//! Card DTOs

use crate::domain::card::Card;
use crate::domain::stage::{ClientStatus, Stage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to enter an order into a pipeline.
///
/// The card lands on the reserved pending stage; entering an order that
/// already has a card leaves the existing card where it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnterPipeline {
    pub order_id: Uuid,
}

/// Request to move an order's card to a target stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCard {
    pub stage_id: Uuid,
}

/// Card as served on board reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
    pub order_id: Uuid,
    pub stage_id: Uuid,
    pub stage_name: String,
    pub client_status: ClientStatus,
    pub moved_at: chrono::DateTime<chrono::Utc>,
}

impl CardView {
    /// Project a card against its resolved stage
    pub fn new(card: &Card, stage: &Stage) -> Self {
        Self {
            order_id: card.order_id,
            stage_id: card.stage_id,
            stage_name: stage.name.clone(),
            client_status: stage.client_status(),
            moved_at: card.moved_at,
        }
    }
}

/// Reduced client-facing projection: the simplified status and nothing else
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: Uuid,
    pub client_status: ClientStatus,
}
