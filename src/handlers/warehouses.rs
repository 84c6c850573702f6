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
    dto::warehouse::{CreateWarehouseRequest, UpdateWarehouseRequest, WarehouseResponse},
    errors::ServiceError,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

pub fn warehouses_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route(
            "/:id",
            get(get_warehouse)
                .put(update_warehouse)
                .delete(delete_warehouse),
        )
}

/// List warehouses
#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    params(PaginationParams),
    responses(
        (status = 200, description = "Warehouses returned", body = ApiResponse<PaginatedResponse<WarehouseResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<WarehouseResponse>> {
    let (page, per_page) = params.normalized();
    let (items, total) = state.catalog_service.list_warehouses(page, per_page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, page, per_page, total,
    ))))
}

/// Create a warehouse
#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse created", body = ApiResponse<WarehouseResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateWarehouseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WarehouseResponse>>), ServiceError> {
    validate_input(&payload)?;
    let warehouse = state.catalog_service.create_warehouse(payload).await?;
    Ok(created_response(warehouse))
}

/// Get a warehouse
#[utoipa::path(
    get,
    path = "/api/v1/warehouses/{id}",
    params(("id" = Uuid, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse returned", body = ApiResponse<WarehouseResponse>),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WarehouseResponse> {
    let warehouse = state.catalog_service.get_warehouse(id).await?;
    Ok(Json(ApiResponse::success(warehouse)))
}

/// Update a warehouse
#[utoipa::path(
    put,
    path = "/api/v1/warehouses/{id}",
    params(("id" = Uuid, Path, description = "Warehouse id")),
    request_body = UpdateWarehouseRequest,
    responses(
        (status = 200, description = "Warehouse updated", body = ApiResponse<WarehouseResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn update_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateWarehouseRequest>,
) -> ApiResult<WarehouseResponse> {
    validate_input(&payload)?;
    let warehouse = state.catalog_service.update_warehouse(id, payload).await?;
    Ok(Json(ApiResponse::success(warehouse)))
}

/// Delete a warehouse without inventory records
#[utoipa::path(
    delete,
    path = "/api/v1/warehouses/{id}",
    params(("id" = Uuid, Path, description = "Warehouse id")),
    responses(
        (status = 204, description = "Warehouse deleted"),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Warehouse still holds stock records", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn delete_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.catalog_service.delete_warehouse(id).await?;
    Ok(no_content_response())
}
