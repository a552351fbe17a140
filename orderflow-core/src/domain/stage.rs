//! Stage domain types
//!
//! A stage is either reserved (fixed semantic meaning, present in every
//! pipeline) or custom (provider-defined). The distinction is modeled as a
//! tagged variant so the deletion and insertion rules can be matched
//! exhaustively instead of checked against a loose type string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One step in a pipeline's workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    /// Display name. Reserved stages can be renamed; their semantics cannot.
    pub name: String,
    /// Ordering key within the pipeline. Sparse, not contiguous; see the
    /// `position` module for the allocation rules.
    pub position: i64,
    #[serde(rename = "system_status", default)]
    pub kind: StageKind,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Stage {
    /// Whether this is one of the four reserved stages
    pub fn is_reserved(&self) -> bool {
        matches!(self.kind, StageKind::Reserved(_))
    }

    /// The reserved semantic of this stage, if any
    pub fn system_status(&self) -> Option<SystemStatus> {
        match self.kind {
            StageKind::Reserved(status) => Some(status),
            StageKind::Custom => None,
        }
    }

    /// The simplified status shown to the party who placed the order.
    ///
    /// Total over every stage: custom stages are provider-internal triage
    /// steps and read as "in progress" from the client's side.
    pub fn client_status(&self) -> ClientStatus {
        match self.kind {
            StageKind::Reserved(status) => status.client_status(),
            StageKind::Custom => ClientStatus::InProgress,
        }
    }
}

/// Reserved-or-custom stage designation
///
/// Serializes as the optional system status (`"pending"`, ..., or `null`),
/// which is also how it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<SystemStatus>", into = "Option<SystemStatus>")]
pub enum StageKind {
    Reserved(SystemStatus),
    Custom,
}

impl Default for StageKind {
    fn default() -> Self {
        StageKind::Custom
    }
}

impl From<Option<SystemStatus>> for StageKind {
    fn from(status: Option<SystemStatus>) -> Self {
        match status {
            Some(status) => StageKind::Reserved(status),
            None => StageKind::Custom,
        }
    }
}

impl From<StageKind> for Option<SystemStatus> {
    fn from(kind: StageKind) -> Self {
        match kind {
            StageKind::Reserved(status) => Some(status),
            StageKind::Custom => None,
        }
    }
}

/// Fixed semantics carried by reserved stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl SystemStatus {
    /// All reserved statuses in their fixed relative order
    pub const ALL: [SystemStatus; 4] = [
        SystemStatus::Pending,
        SystemStatus::Confirmed,
        SystemStatus::Completed,
        SystemStatus::Cancelled,
    ];

    /// Storage representation
    pub fn as_str(self) -> &'static str {
        match self {
            SystemStatus::Pending => "pending",
            SystemStatus::Confirmed => "confirmed",
            SystemStatus::Completed => "completed",
            SystemStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the storage representation
    pub fn parse(s: &str) -> Option<SystemStatus> {
        match s {
            "pending" => Some(SystemStatus::Pending),
            "confirmed" => Some(SystemStatus::Confirmed),
            "completed" => Some(SystemStatus::Completed),
            "cancelled" => Some(SystemStatus::Cancelled),
            _ => None,
        }
    }

    /// Display name given to the stage when a pipeline is created
    pub fn default_label(self) -> &'static str {
        match self {
            SystemStatus::Pending => "New requests",
            SystemStatus::Confirmed => "Confirmed",
            SystemStatus::Completed => "Completed",
            SystemStatus::Cancelled => "Cancelled",
        }
    }

    /// The client-visible status for this reserved semantic.
    ///
    /// `pending` reads as "in progress": clients should not see the
    /// provider-internal triage nomenclature.
    pub fn client_status(self) -> ClientStatus {
        match self {
            SystemStatus::Pending => ClientStatus::InProgress,
            SystemStatus::Confirmed => ClientStatus::Confirmed,
            SystemStatus::Completed => ClientStatus::Completed,
            SystemStatus::Cancelled => ClientStatus::Cancelled,
        }
    }
}

/// Simplified order status shown to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    InProgress,
    Confirmed,
    Completed,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with(kind: StageKind) -> Stage {
        let now = chrono::Utc::now();
        Stage {
            id: Uuid::new_v4(),
            pipeline_id: Uuid::new_v4(),
            name: "Test".to_string(),
            position: 10,
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_client_status_total_over_reserved_stages() {
        assert_eq!(
            stage_with(StageKind::Reserved(SystemStatus::Pending)).client_status(),
            ClientStatus::InProgress
        );
        assert_eq!(
            stage_with(StageKind::Reserved(SystemStatus::Confirmed)).client_status(),
            ClientStatus::Confirmed
        );
        assert_eq!(
            stage_with(StageKind::Reserved(SystemStatus::Completed)).client_status(),
            ClientStatus::Completed
        );
        assert_eq!(
            stage_with(StageKind::Reserved(SystemStatus::Cancelled)).client_status(),
            ClientStatus::Cancelled
        );
    }

    #[test]
    fn test_client_status_custom_is_in_progress() {
        assert_eq!(
            stage_with(StageKind::Custom).client_status(),
            ClientStatus::InProgress
        );
    }

    #[test]
    fn test_system_status_roundtrip() {
        for status in SystemStatus::ALL {
            assert_eq!(SystemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SystemStatus::parse("archived"), None);
    }
}
