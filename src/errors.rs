use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::validation::FieldError;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Conflict",
    "message": "Insufficient quantity in lot 550e8400-e29b-41d4-a716-446655440000: available 20, requested 30",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2024-07-03T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request", "Conflict")
    #[schema(example = "Conflict")]
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Field-level validation failures, when the request body was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {}", join_reasons(.0))]
    ValidationError(Vec<FieldError>),

    #[error("Invalid movement quantity: {0}")]
    InvalidMovementQuantity(String),

    #[error("Invalid cost: {0}")]
    InvalidCost(String),

    #[error(
        "Insufficient quantity in lot {lot_id}: available {available}, requested {requested}"
    )]
    InsufficientLotQuantity {
        lot_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

fn join_reasons(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ServiceError::ValidationError(vec![FieldError::new(field, message)])
    }

    /// Maps a write failure to `ConstraintViolation` when the database
    /// rejected it for a unique or foreign key constraint.
    pub fn from_write_err(err: DbErr, what: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::ConstraintViolation(format!("{} already exists", what))
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_)) => {
                ServiceError::ConstraintViolation(format!(
                    "{} references a missing or still-referenced row",
                    what
                ))
            }
            _ => ServiceError::DatabaseError(err),
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidMovementQuantity(_) | Self::InvalidCost(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InsufficientLotQuantity { .. }
            | Self::ConstraintViolation(_)
            | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_)
            | Self::DataIntegrity(_)
            | Self::InternalError(_)
            | Self::MigrationError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::DataIntegrity(_)
            | Self::InternalError(_)
            | Self::MigrationError(_)
            | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<Vec<FieldError>> {
        match self {
            Self::ValidationError(errors) => Some(errors.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
    }

    #[tokio::test]
    async fn validation_error_response_lists_every_field() {
        let err = ServiceError::ValidationError(vec![
            FieldError::new("quantity", "must be greater than zero"),
            FieldError::new("unit_cost", "must not be negative"),
        ]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        let details = payload.details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[1].field, "unit_cost");
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::invalid_field("x", "y").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidMovementQuantity("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidCost("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InsufficientLotQuantity {
                lot_id: Uuid::nil(),
                available: dec!(20),
                requested: dec!(30),
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::ConstraintViolation("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InsufficientStock("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::db_error("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::db_error("connection reset by peer").response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::DataIntegrity("lot over-drawn".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::NotFound("Lot 1 not found".into()).response_message(),
            "Not found: Lot 1 not found"
        );
    }

    #[test]
    fn insufficient_lot_quantity_message_names_amounts() {
        let err = ServiceError::InsufficientLotQuantity {
            lot_id: Uuid::nil(),
            available: dec!(20),
            requested: dec!(30),
        };
        let message = err.response_message();
        assert!(message.contains("available 20"));
        assert!(message.contains("requested 30"));
    }
}
