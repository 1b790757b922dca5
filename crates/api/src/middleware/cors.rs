use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Browsers may call the storefront API from any origin; credentials travel
/// in the `Authorization` header, never in cookies.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
