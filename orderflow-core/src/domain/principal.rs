//! Request principal types
//!
//! Identity verification happens upstream in the platform's auth gateway;
//! the engine consumes the verified `{ id, role }` principal it forwards.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the verified caller id, set by the auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the verified caller role, set by the auth gateway
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Verified caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}
