//! Stockroom API Library
//!
//! Lot-tracked warehouse inventory valued at a running weighted-average cost.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;
pub mod validation;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub inventory_service: Arc<services::inventory::InventoryService>,
    pub catalog_service: Arc<services::catalog::CatalogService>,
}

impl AppState {
    /// Wires the services over one connection pool and event channel.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let event_sender = Arc::new(event_sender);
        let inventory_service = Arc::new(services::inventory::InventoryService::new(
            db.clone(),
            event_sender.clone(),
            config.lot_rules(),
        ));
        let catalog_service = Arc::new(services::catalog::CatalogService::new(db.clone()));
        Self {
            db,
            config,
            event_sender,
            inventory_service,
            catalog_service,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .nest("/categories", handlers::categories::categories_routes())
        .nest("/warehouses", handlers::warehouses::warehouses_routes())
        .nest("/products", handlers::products::products_routes())
        .nest("/inventory", handlers::inventory::inventory_routes())
        .nest("/movements", handlers::movements::movements_routes())
        .nest("/lots", handlers::lots::lots_routes())
}

/// Full application router: health, `/api/v1` and Swagger UI.
///
/// Outer layers (tracing, CORS, compression) are left to the binary.
pub fn app_router(state: AppState) -> Router {
    let health = health::health_routes_with_state(state.db.clone());
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
        .nest("/health", health)
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "stockroom-api",
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}
