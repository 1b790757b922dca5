//! HTTP surface of the Atelier storefront: public catalog browsing, the
//! signed-in basket and checkout, and the owner's management routes.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::response::IntoResponse;
use axum::Router;
use tower::ServiceBuilder;

use crate::state::AppState;

/// The complete application: every route group behind tracing, CORS and the
/// request body limit.
pub fn app(state: AppState) -> Router {
    let max_body_bytes = state.config().max_body_bytes;
    routes::build_router(state).layer(
        ServiceBuilder::new()
            .layer(middleware::request_tracing::trace_layer())
            .layer(middleware::cors::cors_layer())
            .map_response(IntoResponse::into_response)
            .layer(middleware::body_limit::body_limit_layer(max_body_bytes)),
    )
}
