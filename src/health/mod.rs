/*!
 * # Health Check Module
 *
 * - Basic health check (`/health`) - process is up, no dependencies touched
 * - Readiness check (`/health/ready`) - pings the database
 * - Liveness check (`/health/live`) - uptime
 * - Version (`/health/version`) - build information
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Health check detail
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthDetail {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Overall health information
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: HashMap<String, HealthDetail>,
}

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub health_cache: Arc<RwLock<HealthInfo>>,
    pub start_time: SystemTime,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            db_pool,
            health_cache: Arc::new(RwLock::new(HealthInfo {
                status: HealthStatus::Up,
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
                uptime_seconds: 0,
                details: HashMap::new(),
            })),
            start_time: SystemTime::now(),
        }
    }

    /// Calculate system uptime
    pub fn uptime(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }

    /// Re-checks the database and refreshes the cached status.
    pub async fn update_health(&self) {
        let database = match crate::db::check_connection(&self.db_pool).await {
            Ok(()) => HealthDetail {
                status: HealthStatus::Up,
                message: None,
                timestamp: Utc::now(),
            },
            Err(e) => {
                error!("Database health check failed: {}", e);
                HealthDetail {
                    status: HealthStatus::Down,
                    message: Some(e.response_message()),
                    timestamp: Utc::now(),
                }
            }
        };

        let mut health = self.health_cache.write().await;
        health.timestamp = Utc::now();
        health.uptime_seconds = self.uptime();
        health.details.insert("database".to_string(), database);
        health.status = if health
            .details
            .values()
            .any(|detail| detail.status == HealthStatus::Down)
        {
            HealthStatus::Down
        } else {
            HealthStatus::Up
        };
    }
}

fn status_code(status: &HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
    }))
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");

    (
        StatusCode::OK,
        Json(json!({
            "status": HealthStatus::Up,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.uptime(),
            "timestamp": Utc::now(),
        })),
    )
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Readiness check endpoint called");

    state.update_health().await;
    let health = state.health_cache.read().await;

    (
        status_code(&health.status),
        Json(json!({
            "ready": health.status == HealthStatus::Up,
            "details": health.details,
            "timestamp": health.timestamp,
        })),
    )
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": state.uptime(),
            "timestamp": Utc::now(),
        })),
    )
}

/// Creates router with health check endpoints
pub fn health_routes_with_state(db_pool: Arc<DatabaseConnection>) -> Router {
    let health_state = Arc::new(HealthState::new(db_pool));

    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
        .route("/version", get(version_info))
        .with_state(health_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn ready_pings_the_database() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let app = health_routes_with_state(Arc::new(db));

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn basic_check_does_not_touch_the_database() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let app = health_routes_with_state(Arc::new(db));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
