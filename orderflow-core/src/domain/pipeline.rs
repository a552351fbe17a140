//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A provider's workflow pipeline
///
/// An ordered sequence of stages through which incoming orders progress.
/// Every provider profile owns at least one pipeline; exactly one of them is
/// the default at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    /// Owning provider profile. The profile itself lives in the platform's
    /// profile service; the engine only keys on the id.
    pub profile_id: Uuid,
    /// User account that owns the profile, captured at creation time and
    /// used for ownership checks.
    pub owner_user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Display/card-rendering settings, opaque to the engine. The web tier
    /// interprets these; the engine only stores them.
    pub settings: HashMap<String, serde_json::Value>,
    pub is_default: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
