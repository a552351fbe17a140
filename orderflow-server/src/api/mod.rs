//! API Module
//!
//! HTTP API layer for the pipeline engine.
//! Each submodule handles endpoints for a specific domain.

pub mod card;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod principal;
pub mod stage;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main API router with all endpoints
pub fn create_router(pool: PgPool) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Pipeline endpoints
        .route("/pipeline/create", post(pipeline::create_pipeline))
        .route("/pipeline/list/{profile_id}", get(pipeline::list_pipelines))
        .route("/pipeline/{id}", get(pipeline::get_pipeline))
        .route("/pipeline/{id}", patch(pipeline::update_pipeline))
        .route("/pipeline/{id}", delete(pipeline::delete_pipeline))
        .route("/pipeline/{id}/default", post(pipeline::set_default_pipeline))
        // Stage endpoints
        .route("/pipeline/{id}/stages", post(stage::create_stage))
        .route("/stage/{id}", patch(stage::update_stage))
        .route("/stage/{id}", delete(stage::delete_stage))
        // Card endpoints
        .route("/pipeline/{id}/cards", get(card::list_cards))
        .route("/pipeline/{id}/cards", post(card::enter_pipeline))
        .route("/pipeline/{id}/cards/{order_id}", delete(card::remove_card))
        .route("/pipeline/{id}/cards/{order_id}/move", post(card::move_card))
        .route(
            "/pipeline/{id}/cards/{order_id}/status",
            get(card::order_status),
        )
        // Add state and middleware
        .with_state(pool)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
