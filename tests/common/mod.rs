#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use stockroom_api::{
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    events::{self, EventSender},
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Single-connection in-memory SQLite pool with every migration applied.
///
/// One connection keeps every query on the same in-memory database.
pub async fn migrated_pool() -> DbPool {
    let pool = unmigrated_pool().await;
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    pool
}

pub async fn unmigrated_pool() -> DbPool {
    let cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    db::establish_connection_with_config(&cfg)
        .await
        .expect("failed to create test database")
}

/// Application router over a fresh database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        Self::with_config(cfg).await
    }

    pub async fn with_config(cfg: AppConfig) -> Self {
        let pool = migrated_pool().await;

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));
        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));
        let router = stockroom_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Sends a request and returns the status with the decoded JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("failed to build request"))
            .await
    }

    /// Sends a body verbatim with the given content type.
    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        body: &'static str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", content_type)
            .body(Body::from(body))
            .expect("failed to build request");
        self.send(request).await
    }

    /// A body that is not JSON comes back as `Value::String`.
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Posts and unwraps `data` from a `201 Created` envelope.
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, response) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected response: {response}");
        response["data"].clone()
    }

    pub async fn warehouse(&self, name: &str) -> Uuid {
        let data = self
            .create("/api/v1/warehouses", json!({ "name": name }))
            .await;
        id_of(&data)
    }

    pub async fn product(&self, sku: &str) -> Uuid {
        let data = self
            .create(
                "/api/v1/products",
                json!({ "sku": sku, "name": format!("Product {sku}") }),
            )
            .await;
        id_of(&data)
    }

    /// A warehouse and a product ready to receive stock.
    pub async fn stock_context(&self) -> (Uuid, Uuid) {
        let warehouse_id = self.warehouse("Central").await;
        let product_id = self.product("SKU-1").await;
        (warehouse_id, product_id)
    }

    pub async fn stock_in(&self, warehouse_id: Uuid, product_id: Uuid, quantity: &str, unit_cost: &str) -> Value {
        self.stock_in_with(json!({
            "warehouse_id": warehouse_id,
            "product_id": product_id,
            "quantity": quantity,
            "unit_cost": unit_cost,
        }))
        .await
    }

    pub async fn stock_in_with(&self, body: Value) -> Value {
        self.create("/api/v1/movements/stock-in", body).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("no id in {value}"))
}

/// Reads a decimal serialized as a string or a number.
pub fn dec_of(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).unwrap_or_else(|_| panic!("not a decimal: {value}"))
}
