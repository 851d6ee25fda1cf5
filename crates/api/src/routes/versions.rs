use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use blockdraft_core::diff;
use blockdraft_core::document::DocumentId;
use blockdraft_core::snapshot::{Snapshot, SnapshotHeader};

use crate::error::ApiResult;
use crate::routes::actor;
use crate::state::AppState;

/// Version history: save, list, fetch, label, compare, restore.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/documents/{id}/save", post(save))
        .route("/v1/documents/{id}/versions", get(list_versions))
        .route("/v1/documents/{id}/versions/{version}", get(get_version))
        .route("/v1/documents/{id}/versions/{version}/label", put(label_version))
        .route("/v1/documents/{id}/versions/{from}/diff/{to}", get(diff_versions))
        .route("/v1/documents/{id}/restore", post(restore))
}

async fn save(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    headers: HeaderMap,
) -> ApiResult<Json<SnapshotHeader>> {
    let session = state.session(id, &actor(&headers)).await?;
    let snapshot = session.save().await?;
    Ok(Json(snapshot.header()))
}

async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> ApiResult<Json<Vec<SnapshotHeader>>> {
    Ok(Json(state.store().list(id).await?))
}

async fn get_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(DocumentId, u64)>,
) -> ApiResult<Json<Snapshot>> {
    Ok(Json(state.store().get(id, version).await?))
}

#[derive(Debug, Deserialize)]
struct LabelRequest {
    label: String,
}

async fn label_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(DocumentId, u64)>,
    Json(req): Json<LabelRequest>,
) -> ApiResult<Json<Value>> {
    state.store().label(id, version, req.label).await?;
    Ok(Json(json!({ "labeled": true })))
}

async fn diff_versions(
    State(state): State<AppState>,
    Path((id, from, to)): Path<(DocumentId, u64, u64)>,
) -> ApiResult<Json<Value>> {
    let from = state.store().get(id, from).await?;
    let to = state.store().get(id, to).await?;
    let entries = diff::diff(&from.blocks, &to.blocks);
    let rendered = diff::render(&entries);
    Ok(Json(json!({ "entries": entries, "rendered": rendered })))
}

#[derive(Debug, Deserialize)]
struct RestoreRequest {
    version: u64,
}

async fn restore(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    headers: HeaderMap,
    Json(req): Json<RestoreRequest>,
) -> ApiResult<Json<SnapshotHeader>> {
    let session = state.session(id, &actor(&headers)).await?;
    let snapshot = session.restore(req.version).await?;
    Ok(Json(snapshot.header()))
}
