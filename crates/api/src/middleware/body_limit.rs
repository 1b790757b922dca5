use tower_http::limit::RequestBodyLimitLayer;

/// Reject request bodies larger than `max_bytes` with 413.
pub fn body_limit_layer(max_bytes: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max_bytes)
}
