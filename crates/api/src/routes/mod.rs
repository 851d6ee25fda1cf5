pub mod documents;
pub mod health;
pub mod versions;

use axum::http::HeaderMap;
use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(documents::routes())
        .merge(versions::routes())
        .with_state(state)
}

/// Actor name supplied by the identity collaborator upstream of this
/// service; authorization has already happened by the time we run.
pub(crate) fn actor(headers: &HeaderMap) -> String {
    headers
        .get("x-actor")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("editor")
        .to_string()
}
