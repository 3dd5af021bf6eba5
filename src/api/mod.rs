// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::TemplateService;
use handlers::templates;

/// Builds the HTTP gateway over the template service
pub fn router(service: TemplateService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(templates::health_check))
        .route(
            "/api/templates",
            post(templates::create_template).get(templates::list_templates),
        )
        .route(
            "/api/templates/:id",
            get(templates::get_template)
                .patch(templates::update_template)
                .delete(templates::delete_template),
        )
        .route(
            "/api/templates/:id/versions",
            post(templates::create_version).get(templates::list_versions),
        )
        .route(
            "/api/templates/:id/versions/:version",
            get(templates::get_version),
        )
        .route(
            "/api/templates/:id/current-version",
            put(templates::set_current_version),
        )
        .route("/api/templates/:id/render", post(templates::render_template))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}
