use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::common::{created_response, validate_input, JsonBody, PaginationParams};
use crate::{
    dto::movement::{
        AdjustmentRequest, AdjustmentResponse, MovementFilters, MovementResponse, StockInRequest,
        StockInResponse, StockOutRequest, StockOutResponse,
    },
    errors::ServiceError,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

pub fn movements_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movements))
        .route("/stock-in", post(stock_in))
        .route("/stock-out", post(stock_out))
        .route("/adjustments", post(adjust_stock))
        .route("/:id", get(get_movement))
}

/// Receive a lot and recompute the weighted-average cost
#[utoipa::path(
    post,
    path = "/api/v1/movements/stock-in",
    request_body = StockInRequest,
    responses(
        (status = 201, description = "Stock received", body = ApiResponse<StockInResponse>),
        (status = 400, description = "Invalid quantity, cost or request body", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn stock_in(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<StockInRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StockInResponse>>), ServiceError> {
    validate_input(&payload)?;
    let received = state.inventory_service.stock_in(payload).await?;
    Ok(created_response(received))
}

/// Issue stock from named lots or in FIFO/FEFO order
#[utoipa::path(
    post,
    path = "/api/v1/movements/stock-out",
    request_body = StockOutRequest,
    responses(
        (status = 201, description = "Stock issued", body = ApiResponse<StockOutResponse>),
        (status = 400, description = "Invalid quantity or request body", body = crate::errors::ErrorResponse),
        (status = 404, description = "Inventory record or lot not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "A named lot holds less than requested", body = crate::errors::ErrorResponse),
        (status = 422, description = "Eligible lots cannot cover the quantity", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn stock_out(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<StockOutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StockOutResponse>>), ServiceError> {
    validate_input(&payload)?;
    let issued = state.inventory_service.stock_out(payload).await?;
    Ok(created_response(issued))
}

/// Correct stock after a count
#[utoipa::path(
    post,
    path = "/api/v1/movements/adjustments",
    request_body = AdjustmentRequest,
    responses(
        (status = 201, description = "Adjustment recorded", body = ApiResponse<AdjustmentResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Inventory record or lot not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "The lot holds less than requested", body = crate::errors::ErrorResponse),
        (status = 422, description = "Lots cannot cover the quantity", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AdjustmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdjustmentResponse>>), ServiceError> {
    validate_input(&payload)?;
    let adjustment = state.inventory_service.adjust(payload).await?;
    Ok(created_response(adjustment))
}

/// List movements, newest first
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(PaginationParams, MovementFilters),
    responses(
        (status = 200, description = "Movements returned", body = ApiResponse<PaginatedResponse<MovementResponse>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filters): Query<MovementFilters>,
) -> ApiResult<PaginatedResponse<MovementResponse>> {
    let (page, per_page) = params.normalized();
    let (items, total) = state
        .inventory_service
        .list_movements(filters, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, page, per_page, total,
    ))))
}

/// Get a movement with its lines
#[utoipa::path(
    get,
    path = "/api/v1/movements/{id}",
    params(("id" = Uuid, Path, description = "Movement id")),
    responses(
        (status = 200, description = "Movement returned", body = ApiResponse<MovementResponse>),
        (status = 404, description = "Movement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MovementResponse> {
    let movement = state.inventory_service.get_movement(id).await?;
    Ok(Json(ApiResponse::success(movement)))
}
