use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::common::{
    created_response, no_content_response, validate_input, JsonBody, PaginationParams,
};
use crate::{
    dto::{
        inventory::{CreateInventoryRecordRequest, InventoryFilters, InventoryRecordResponse},
        lot::LotResponse,
    },
    errors::ServiceError,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory).post(create_inventory_record))
        .route(
            "/:id",
            get(get_inventory_record).delete(delete_inventory_record),
        )
        .route("/:id/lots", get(list_record_lots))
}

/// List inventory records with on-hand quantity and valuation
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PaginationParams, InventoryFilters),
    responses(
        (status = 200, description = "Inventory records returned",
            body = ApiResponse<PaginatedResponse<InventoryRecordResponse>>,
            headers(
                ("X-Request-Id" = String, description = "Unique request id for tracing"),
            )
        ),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filters): Query<InventoryFilters>,
) -> ApiResult<PaginatedResponse<InventoryRecordResponse>> {
    let (page, per_page) = params.normalized();
    let (items, total) = state
        .inventory_service
        .list_records(filters, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, page, per_page, total,
    ))))
}

/// Register a product in a warehouse with no stock
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryRecordRequest,
    responses(
        (status = 201, description = "Inventory record created", body = ApiResponse<InventoryRecordResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or warehouse not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Record already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_inventory_record(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateInventoryRecordRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryRecordResponse>>), ServiceError> {
    validate_input(&payload)?;
    let record = state.inventory_service.create_record(payload).await?;
    Ok(created_response(record))
}

/// Get an inventory record
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory record id")),
    responses(
        (status = 200, description = "Inventory record returned", body = ApiResponse<InventoryRecordResponse>),
        (status = 404, description = "Inventory record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<InventoryRecordResponse> {
    let record = state.inventory_service.get_record(id).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// Delete an inventory record that has no lots
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory record id")),
    responses(
        (status = 204, description = "Inventory record deleted"),
        (status = 404, description = "Inventory record not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Lots still reference the record", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_inventory_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.inventory_service.delete_record(id).await?;
    Ok(no_content_response())
}

/// Lots of an inventory record with their derived quantities
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/lots",
    params(("id" = Uuid, Path, description = "Inventory record id")),
    responses(
        (status = 200, description = "Lots returned", body = ApiResponse<Vec<LotResponse>>),
        (status = 404, description = "Inventory record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_record_lots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<LotResponse>> {
    let lots = state.inventory_service.list_lots(id).await?;
    Ok(Json(ApiResponse::success(lots)))
}
