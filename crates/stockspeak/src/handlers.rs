use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stock_catalog::{Catalog, RawCatalogRecord, overrides_from_value};
use stock_types::{CatalogItem, LocationOverrides, StockFlag, classify};
use thiserror::Error;
use tracing::{error, info};

use crate::cache::IndexCache;
use crate::parser::SpeechAnalysis;

/// Cache key for parsers built from the server catalog.
pub const SERVER_CATALOG_KEY: &str = "server";

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<Arc<Vec<CatalogItem>>>>,
    pub cache: Arc<IndexCache>,
    pub overrides: Arc<HashMap<String, LocationOverrides>>,
    pub default_location: String,
    pub max_transcript_len: usize,
}

impl AppState {
    pub fn new(catalog: Vec<CatalogItem>, cache: IndexCache) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            cache: Arc::new(cache),
            overrides: Arc::new(HashMap::new()),
            default_location: "default".to_string(),
            max_transcript_len: 4096,
        }
    }

    fn catalog_snapshot(&self) -> Result<Arc<Vec<CatalogItem>>, ApiError> {
        let guard = self.catalog.read().map_err(|_| {
            error!("catalog lock poisoned");
            ApiError::Internal
        })?;
        Ok(Arc::clone(&guard))
    }
}

#[derive(Deserialize)]
pub struct ParseRequest {
    pub transcript: String,
    pub location: Option<String>,
    pub catalog: Option<Vec<RawCatalogRecord>>,
    pub overrides: Option<Value>,
}

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub qty: f64,
    pub low: Option<f64>,
}

#[derive(Serialize)]
struct ClassifyResponse {
    flag: StockFlag,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogResponse {
    item_count: usize,
    items: Vec<CatalogItem>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/catalog", get(get_catalog).put(put_catalog))
        .route("/v1/parse", post(parse))
        .route("/v1/classify", post(classify_qty))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn get_catalog(State(state): State<AppState>) -> Result<Json<CatalogResponse>, ApiError> {
    let items = state.catalog_snapshot()?;
    Ok(Json(CatalogResponse {
        item_count: items.len(),
        items: items.as_ref().clone(),
    }))
}

async fn put_catalog(
    State(state): State<AppState>,
    Json(records): Json<Vec<RawCatalogRecord>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let items = Catalog::from_records(records).into_items();
    {
        let mut guard = state.catalog.write().map_err(|_| {
            error!("catalog lock poisoned");
            ApiError::Internal
        })?;
        *guard = Arc::new(items.clone());
    }
    state.cache.invalidate(SERVER_CATALOG_KEY);
    info!("server catalog replaced ({} items)", items.len());
    Ok(Json(CatalogResponse {
        item_count: items.len(),
        items,
    }))
}

async fn parse(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<SpeechAnalysis>, ApiError> {
    if request.transcript.chars().count() > state.max_transcript_len {
        return Err(ApiError::bad_request(format!(
            "transcript must be at most {} characters",
            state.max_transcript_len
        )));
    }

    let location = request
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(state.default_location.as_str());
    let mut overrides = state.overrides.get(location).cloned().unwrap_or_default();
    if let Some(extra) = &request.overrides {
        if !extra.is_object() {
            return Err(ApiError::bad_request("overrides must be an object"));
        }
        overrides.merge(&overrides_from_value(extra));
    }

    let parser = match request.catalog {
        Some(records) => {
            let items = Catalog::from_records(records).into_items();
            Arc::new(state.cache.build_uncached(items))
        }
        None => {
            let items = state.catalog_snapshot()?;
            state.cache.parser_for(SERVER_CATALOG_KEY, &items)
        }
    };

    Ok(Json(parser.analyze(&request.transcript, &overrides)))
}

async fn classify_qty(Json(request): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    Json(ClassifyResponse {
        flag: classify(request.qty, request.low),
    })
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
