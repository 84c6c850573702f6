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
    dto::category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
    errors::ServiceError,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

/// List categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(PaginationParams),
    responses(
        (status = 200, description = "Categories returned", body = ApiResponse<PaginatedResponse<CategoryResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<CategoryResponse>> {
    let (page, per_page) = params.normalized();
    let (items, total) = state.catalog_service.list_categories(page, per_page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, page, per_page, total,
    ))))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ServiceError> {
    validate_input(&payload)?;
    let category = state.catalog_service.create_category(payload).await?;
    Ok(created_response(category))
}

/// Get a category
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category returned", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CategoryResponse> {
    let category = state.catalog_service.get_category(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    validate_input(&payload)?;
    let category = state.catalog_service.update_category(id, payload).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// Delete a category no product uses
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still in use", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.catalog_service.delete_category(id).await?;
    Ok(no_content_response())
}
