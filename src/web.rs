//! HTTP surface of the content store
//!
//! Every failure, including a body axum could not parse, is answered with a
//! JSON `{"error": ...}` body via [`ContentError`]'s response mapping.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::content_record::{ContentRecord, VerificationStatus};
use crate::content_store::ContentStore;
use crate::errors::{ContentError, ContentResult};
use crate::verification::ChainAudit;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    status: VerificationStatus,
}

/// Routes for the content API plus a health check
pub fn content_router(store: Arc<ContentStore>) -> Router {
    Router::new()
        .route("/content", get(list_content).post(create_content))
        .route(
            "/content/{id}",
            get(get_content).put(update_content).delete(delete_content),
        )
        .route("/content/{id}/verify", get(verify_content))
        .route("/content/{id}/audit", get(audit_content))
        .route("/content/{id}/status", put(set_status))
        .route("/healthz", get(healthz))
        .with_state(store)
}

/// CORS for the given origin, or for any origin when none is configured
pub fn cors_layer(origin: Option<&str>) -> ContentResult<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|e| ContentError::config(format!("invalid cors origin: {e}")))?;
            Ok(layer.allow_origin(origin))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

async fn create_content(
    State(store): State<Arc<ContentStore>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ContentRecord>), ContentError> {
    let Json(payload) = payload?;
    let record = store.create(payload)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_content(
    State(store): State<Arc<ContentStore>>,
    Path(id): Path<u64>,
) -> Result<Json<ContentRecord>, ContentError> {
    Ok(Json(store.get(id)?))
}

async fn update_content(
    State(store): State<Arc<ContentStore>>,
    Path(id): Path<u64>,
    patch: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ContentRecord>, ContentError> {
    let Json(patch) = patch?;
    Ok(Json(store.update(id, &patch)?))
}

async fn list_content(
    State(store): State<Arc<ContentStore>>,
) -> Result<Json<Vec<ContentRecord>>, ContentError> {
    Ok(Json(store.list()?))
}

async fn delete_content(
    State(store): State<Arc<ContentStore>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ContentError> {
    store.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_content(
    State(store): State<Arc<ContentStore>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ContentError> {
    let valid = store.verify(id)?;
    Ok(Json(serde_json::json!({ "valid": valid })))
}

async fn audit_content(
    State(store): State<Arc<ContentStore>>,
    Path(id): Path<u64>,
) -> Result<Json<ChainAudit>, ContentError> {
    Ok(Json(store.audit(id)?))
}

async fn set_status(
    State(store): State<Arc<ContentStore>>,
    Path(id): Path<u64>,
    req: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<ContentRecord>, ContentError> {
    let Json(req) = req?;
    Ok(Json(store.set_status(id, req.status)?))
}

async fn healthz(State(store): State<Arc<ContentStore>>) -> Result<Json<Value>, ContentError> {
    let records = store.len()?;
    Ok(Json(serde_json::json!({ "status": "ok", "records": records })))
}
