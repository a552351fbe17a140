//! Card domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The association between one order and its current stage in one pipeline
///
/// An order has at most one card per pipeline. Moving a card changes its
/// stage reference and transition timestamp; it is never duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    /// The order is a foreign reference owned by the platform's order
    /// service; the engine never mutates it.
    pub order_id: Uuid,
    pub pipeline_id: Uuid,
    pub stage_id: Uuid,
    /// Timestamp of the last stage transition
    pub moved_at: chrono::DateTime<chrono::Utc>,
}
