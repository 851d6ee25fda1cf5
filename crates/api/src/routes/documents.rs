use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use blockdraft_core::block::{BlockFields, BlockId};
use blockdraft_core::document::{Document, DocumentId, DocumentMeta};
use blockdraft_core::template;

use crate::error::{ApiError, ApiResult};
use crate::routes::actor;
use crate::state::AppState;

/// Document CRUD and block operations.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/documents", post(create_document).get(list_documents))
        .route("/v1/documents/{id}", get(get_document).delete(delete_document))
        .route("/v1/documents/{id}/meta", put(update_meta))
        .route("/v1/documents/{id}/blocks", post(add_block))
        .route(
            "/v1/documents/{id}/blocks/{block_id}",
            put(update_block).delete(remove_block),
        )
        .route("/v1/documents/{id}/blocks/{block_id}/move", post(move_block))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentRequest {
    title: String,
    slug: String,
    /// Built-in template name; empty document when absent.
    template: Option<String>,
}

async fn create_document(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> ApiResult<Json<Document>> {
    let meta = DocumentMeta::draft(req.title, req.slug);
    let doc = match req.template.as_deref() {
        None => state.registry().create(meta).await?,
        Some(name) => {
            let template = template::builtin(name)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown template {name:?}")))?;
            state
                .registry()
                .create_from_template(meta, &template)
                .await?
        }
    };
    Ok(Json(doc))
}

async fn list_documents(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.registry().list().await)
}

async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> ApiResult<Json<Document>> {
    Ok(Json(state.registry().get(id).await?))
}

async fn update_meta(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    headers: HeaderMap,
    Json(meta): Json<DocumentMeta>,
) -> ApiResult<Json<Document>> {
    let session = state.session(id, &actor(&headers)).await?;
    session.update_meta(meta).await?;
    Ok(Json(session.document().await))
}

async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> ApiResult<Json<Value>> {
    state.close_session(id).await;
    state.registry().soft_delete(id).await?;
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBlockRequest {
    #[serde(flatten)]
    fields: BlockFields,
    at_index: usize,
}

async fn add_block(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    headers: HeaderMap,
    Json(req): Json<AddBlockRequest>,
) -> ApiResult<Json<Value>> {
    let session = state.session(id, &actor(&headers)).await?;
    let block_id = session.add_block(req.fields, req.at_index).await?;
    Ok(Json(json!({ "blockId": block_id })))
}

async fn update_block(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(DocumentId, BlockId)>,
    headers: HeaderMap,
    Json(fields): Json<BlockFields>,
) -> ApiResult<Json<Value>> {
    let session = state.session(id, &actor(&headers)).await?;
    session.update_block_fields(block_id, fields).await?;
    Ok(Json(json!({ "updated": true })))
}

async fn remove_block(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(DocumentId, BlockId)>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let session = state.session(id, &actor(&headers)).await?;
    session.remove_block(block_id).await?;
    Ok(Json(json!({ "removed": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveBlockRequest {
    /// Sibling to land after; front of the document when `null`.
    after: Option<BlockId>,
}

async fn move_block(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(DocumentId, BlockId)>,
    headers: HeaderMap,
    Json(req): Json<MoveBlockRequest>,
) -> ApiResult<Json<Value>> {
    let session = state.session(id, &actor(&headers)).await?;
    session.move_block(block_id, req.after).await?;
    Ok(Json(json!({ "moved": true })))
}
