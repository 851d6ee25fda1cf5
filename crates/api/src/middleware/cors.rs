use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer for the editor frontend. Origin stays permissive for
/// development; methods match the block/version operation surface.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
