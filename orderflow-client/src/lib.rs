//! Orderflow HTTP Client
//!
//! A simple, type-safe HTTP client for communicating with the Orderflow
//! pipeline engine API.
//!
//! This crate provides a unified interface for the platform's web tier and
//! admin console to manage pipelines on behalf of an authenticated user,
//! eliminating code duplication and ensuring consistency. The caller's
//! verified identity is forwarded on every request through the same headers
//! the auth gateway uses.
//!
//! # Example
//!
//! ```no_run
//! use orderflow_client::EngineClient;
//! use orderflow_core::domain::principal::{Principal, Role};
//! use orderflow_core::dto::pipeline::CreatePipeline;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = EngineClient::new("http://localhost:8080");
//!     let principal = Principal { id: Uuid::new_v4(), role: Role::User };
//!
//!     // Create a pipeline
//!     let pipeline = client.create_pipeline(&principal, CreatePipeline {
//!         profile_id: Uuid::new_v4(),
//!         name: "Sales".to_string(),
//!         description: None,
//!     }).await?;
//!
//!     println!("Created pipeline: {}", pipeline.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod cards;
mod pipelines;
mod stages;

// Re-export commonly used types
pub use error::{ClientError, Result};

use orderflow_core::domain::principal::{Principal, USER_ID_HEADER, USER_ROLE_HEADER};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

/// HTTP client for the Orderflow pipeline engine API
///
/// This client provides methods for all engine endpoints, organized into
/// logical groups:
/// - Pipeline management (create, list, get, update, set default, delete)
/// - Stage management (create, rename/reorder, delete)
/// - Card assignments (enter, move, list, status projection, remove)
#[derive(Debug, Clone)]
pub struct EngineClient {
    /// Base URL of the engine (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl EngineClient {
    /// Create a new engine client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the engine API (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new engine client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the engine
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Request and Response Handlers
    // =============================================================================

    /// Build a request with the caller's identity headers attached
    fn request(
        &self,
        method: Method,
        path: &str,
        principal: &Principal,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(USER_ID_HEADER, principal.id.to_string())
            .header(USER_ROLE_HEADER, principal.role.as_str())
    }

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("Engine API error (status {}): {}", status, error_text);
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("Engine API error (status {}): {}", status, error_text);
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = EngineClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = EngineClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = EngineClient::with_client("http://localhost:8080", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
