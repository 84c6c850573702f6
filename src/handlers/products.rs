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
    dto::product::{CreateProductRequest, ProductFilters, ProductResponse, UpdateProductRequest},
    errors::ServiceError,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams, ProductFilters),
    responses(
        (status = 200, description = "Products returned", body = ApiResponse<PaginatedResponse<ProductResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filters): Query<ProductFilters>,
) -> ApiResult<PaginatedResponse<ProductResponse>> {
    let (page, per_page) = params.normalized();
    let (items, total) = state
        .catalog_service
        .list_products(filters, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, page, per_page, total,
    ))))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    validate_input(&payload)?;
    let product = state.catalog_service.create_product(payload).await?;
    Ok(created_response(product))
}

/// Get a product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product returned", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductResponse> {
    let product = state.catalog_service.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Update a product. The SKU is fixed at creation.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateProductRequest>,
) -> ApiResult<ProductResponse> {
    validate_input(&payload)?;
    let product = state.catalog_service.update_product(id, payload).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Delete a product that is not stocked anywhere
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product still has inventory records", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.catalog_service.delete_product(id).await?;
    Ok(no_content_response())
}
