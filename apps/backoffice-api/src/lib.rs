//! Back-office API - HTTP surface over the template and document services
//!
//! Provides REST endpoints for:
//! - Client management
//! - System variable catalogs and template validation
//! - Template management (CRUD, duplication, search)
//! - Document generation and status changes
//! - Stateless substitution previews

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// Build the router over `state`
pub fn app(state: Arc<AppState>) -> Router {
    // CORS configuration for the editor front-end
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Stateless preview
        .route("/api/render", post(handlers::render_preview))
        // Clients
        .route(
            "/api/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route("/api/clients/search", get(handlers::search_clients))
        .route(
            "/api/clients/:id",
            get(handlers::get_client)
                .put(handlers::update_client)
                .delete(handlers::delete_client),
        )
        // Catalogs
        .route("/api/:family/variables", get(handlers::system_variables))
        // Templates
        .route(
            "/api/:family/templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
        .route(
            "/api/:family/templates/validate",
            post(handlers::validate_template),
        )
        .route(
            "/api/:family/templates/search",
            get(handlers::search_templates),
        )
        .route(
            "/api/:family/templates/:id",
            get(handlers::get_template)
                .put(handlers::update_template)
                .delete(handlers::delete_template),
        )
        .route(
            "/api/:family/templates/:id/editor",
            get(handlers::editor_markup),
        )
        .route(
            "/api/:family/templates/:id/duplicate",
            post(handlers::duplicate_template),
        )
        // Documents
        .route(
            "/api/:family/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route(
            "/api/:family/documents/:id",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        .route(
            "/api/:family/documents/:id/status",
            post(handlers::change_status),
        )
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
