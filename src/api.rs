//! HTTP routes over the engine.
//!
//! Authentication happens upstream; the caller's scope arrives in headers:
//! `x-space`, `x-owner-type` + `x-owner-id`, and optional comma-separated
//! allow lists `x-extensions` and `x-lovs`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    routing::{delete, get, post},
    Json, Router,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::Engine;
use crate::error::{FieldforgeError, Result};
use crate::extension::{ExtendedRecord, ExtensionFieldModel, ExtensionPoint};
use crate::model::{LovOption, LovType, ModelDef};
use crate::response::{self, Response};
use crate::security::{ExtensionOwner, SecurityContext};

const DEFAULT_SPACE: &str = "default";

/// Security context read from request headers.
#[derive(Debug, Clone)]
pub struct HeaderSecurityContext {
    space: String,
    owner: Option<ExtensionOwner>,
    extensions: Option<HashSet<String>>,
    lovs: Option<HashSet<String>>,
}

impl HeaderSecurityContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let list = |name: &str| {
            header(name).map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<HashSet<_>>()
            })
        };

        let owner = match (header("x-owner-type"), header("x-owner-id")) {
            (Some(owner_type), Some(owner_id)) => Some(ExtensionOwner::new(owner_type, owner_id)),
            _ => None,
        };

        Self {
            space: header("x-space").unwrap_or_else(|| DEFAULT_SPACE.to_string()),
            owner,
            extensions: list("x-extensions"),
            lovs: list("x-lovs"),
        }
    }
}

impl SecurityContext for HeaderSecurityContext {
    fn space_identity(&self) -> String {
        self.space.clone()
    }

    fn extension_owner(&self, _point: &ExtensionPoint) -> Option<ExtensionOwner> {
        self.owner.clone()
    }

    fn is_extension_authorized(&self, point: &ExtensionPoint) -> bool {
        self.extensions
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&point.name))
    }

    fn is_lov_authorized(&self, lov_name: &str) -> bool {
        self.lovs.as_ref().map_or(true, |allowed| allowed.contains(lov_name))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub values: IndexMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub deleted: usize,
}

/// Router with every route; state is the shared engine.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/models/fetch/:model_name", get(fetch_model))
        .route("/extensions/fetch/:extension_name", get(fetch_extension_fields))
        .route("/extensions/save", post(save_extension_field))
        .route("/extensions/update", post(update_extension_field))
        .route("/extensions/delete/:extension_name/:field_id", delete(delete_extension_field))
        .route("/extensions/read/:extension_name/:field_id", get(read_extension_field))
        .route("/extensions/deleteAll", delete(delete_all_extension_fields))
        .route("/extensions/records/:extension_name", post(save_extended_record))
        .route("/extensions/records/:extension_name/:record_id", get(read_extended_values))
        .route("/lov/fetch/:lov_name/:lov_type", get(fetch_lov))
        .route("/lov/fetchDependentLov/:lov_name/:dependency_value", get(fetch_dependent_lov))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Envelope as JSON with the matching HTTP status.
fn reply<T: Serialize>(result: Result<T>) -> HttpResponse {
    let body = Response::from(result);
    let status = match body.code {
        response::SUCCESS => StatusCode::OK,
        response::INVALID_REQUEST => StatusCode::BAD_REQUEST,
        response::UNAUTHORIZED => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(body)).into_response()
}

/// Run synchronous engine work off the async workers.
///
/// Lock waits and row source reads block the calling thread.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| FieldforgeError::Internal(format!("Engine task failed: {}", e)))?
}

async fn fetch_model(
    State(engine): State<Arc<Engine>>,
    Path(model_name): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> HttpResponse {
    reply(blocking(move || match query.locale.as_deref() {
        Some(locale) if locale != engine.config().default_locale => {
            engine.models().localized_model_def(&model_name, locale)
        }
        _ => engine.models().model_def(&model_name).map(|def| ModelDef::clone(&def)),
    })
    .await)
}

async fn fetch_extension_fields(
    State(engine): State<Arc<Engine>>,
    Path(extension_name): Path<String>,
    headers: HeaderMap,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    reply(blocking(move || engine.extensions().fetch_extension_fields(&extension_name, &security)).await)
}

async fn save_extension_field(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    Json(model): Json<ExtensionFieldModel>,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    reply(blocking(move || engine.extensions().save_extension_field(&model, &security)).await)
}

async fn update_extension_field(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    Json(model): Json<ExtensionFieldModel>,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    reply(blocking(move || engine.extensions().update_extension_field(&model, &security)).await)
}

async fn delete_extension_field(
    State(engine): State<Arc<Engine>>,
    Path((extension_name, field_id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    reply(blocking(move || {
        engine
            .extensions()
            .delete_extension_field(&extension_name, field_id, &security)
            .map(|()| field_id)
    })
    .await)
}

async fn read_extension_field(
    State(engine): State<Arc<Engine>>,
    Path((extension_name, field_id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    reply(blocking(move || engine.extensions().read_extension_field(&extension_name, field_id, &security)).await)
}

async fn delete_all_extension_fields(State(engine): State<Arc<Engine>>, headers: HeaderMap) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    reply(blocking(move || {
        engine
            .extensions()
            .delete_all_extension_fields(&security)
            .map(|deleted| DeletedCount { deleted })
    })
    .await)
}

async fn save_extended_record(
    State(engine): State<Arc<Engine>>,
    Path(extension_name): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RecordRequest>,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    let result: Result<ExtendedRecord> = blocking(move || {
        engine
            .extensions()
            .save_extended_record(&extension_name, request.id, &request.values, &security)
    })
    .await;
    reply(result)
}

async fn read_extended_values(
    State(engine): State<Arc<Engine>>,
    Path((extension_name, record_id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    reply(blocking(move || engine.extensions().read_extended_values(&extension_name, record_id, &security)).await)
}

async fn fetch_lov(
    State(engine): State<Arc<Engine>>,
    Path((lov_name, lov_type)): Path<(String, String)>,
    Query(query): Query<LocaleQuery>,
    headers: HeaderMap,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    let result: Result<Vec<LovOption>> = blocking(move || {
        let lov_type = lov_type.parse::<LovType>().map_err(FieldforgeError::invalid)?;
        engine
            .lovs()
            .fetch(&lov_name, lov_type, query.locale.as_deref(), &security)
            .map_err(FieldforgeError::from)
    })
    .await;
    reply(result)
}

async fn fetch_dependent_lov(
    State(engine): State<Arc<Engine>>,
    Path((lov_name, dependency_value)): Path<(String, String)>,
    Query(query): Query<LocaleQuery>,
    headers: HeaderMap,
) -> HttpResponse {
    let security = HeaderSecurityContext::from_headers(&headers);
    let result: Result<Vec<LovOption>> = blocking(move || {
        engine
            .lovs()
            .get_dynamic_lov_values(&lov_name, Some(&dependency_value), query.locale.as_deref(), &security)
            .map_err(FieldforgeError::from)
    })
    .await;
    reply(result)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "fieldforge-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
