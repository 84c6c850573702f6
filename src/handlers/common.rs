use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::IntoParams;

use crate::errors::ServiceError;
use crate::validation::Validate;
use crate::{ApiResponse, PaginatedResponse};

/// Largest page a list endpoint returns.
pub const MAX_PER_PAGE: u64 = 100;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Standard no content response
pub fn no_content_response() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// JSON request body whose rejections use the API error format.
///
/// Malformed JSON, a wrong content type or an unknown field all answer 400
/// with an `ErrorResponse` instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ServiceError::invalid_field("body", rejection.body_text())),
        }
    }
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().into_result()
}

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Page and page size clamped to the accepted range.
    pub fn normalized(&self) -> (u64, u64) {
        (self.page.max(1), self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let params = PaginationParams {
            page: 0,
            per_page: 10_000,
        };
        assert_eq!(params.normalized(), (1, MAX_PER_PAGE));
        assert_eq!(PaginationParams::default().normalized(), (1, 20));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PaginatedResponse::new(vec![1, 2], 1, 2, 5);
        assert_eq!(page.total_pages, 3);
        let empty = PaginatedResponse::<u8>::new(vec![], 1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
