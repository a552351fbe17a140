//! Principal Extraction
//!
//! The platform's auth gateway terminates authentication and forwards the
//! verified identity in trusted headers; handlers receive it through this
//! extractor. Requests without a usable identity are rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use orderflow_core::domain::principal::{Principal, Role, USER_ID_HEADER, USER_ROLE_HEADER};
use uuid::Uuid;

use crate::api::error::ApiError;

/// Extractor wrapper around the verified caller identity
#[derive(Debug, Clone, Copy)]
pub struct AuthPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_str(parts, USER_ID_HEADER)?;
        let id = Uuid::parse_str(id)
            .map_err(|_| ApiError::Unauthorized("Malformed identity header".to_string()))?;

        let role = header_str(parts, USER_ROLE_HEADER)?;
        let role = Role::parse(role)
            .ok_or_else(|| ApiError::Unauthorized("Unknown caller role".to_string()))?;

        Ok(AuthPrincipal(Principal { id, role }))
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {name} header")))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("Malformed {name} header")))
}
