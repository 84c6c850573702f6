use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::common::{validate_input, JsonBody};
use crate::{
    dto::lot::{LotConsumptionResponse, LotResponse, UpdateLotNotesRequest},
    ApiResponse, ApiResult, AppState,
};

pub fn lots_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_lot).patch(update_lot_notes))
        .route("/:id/consumptions", get(list_lot_consumptions))
}

/// Get a lot with its derived quantity
#[utoipa::path(
    get,
    path = "/api/v1/lots/{id}",
    params(("id" = Uuid, Path, description = "Lot id")),
    responses(
        (status = 200, description = "Lot returned", body = ApiResponse<LotResponse>),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse)
    ),
    tag = "lots"
)]
pub async fn get_lot(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<LotResponse> {
    let lot = state.inventory_service.get_lot(id).await?;
    Ok(Json(ApiResponse::success(lot)))
}

/// Edit the notes of a lot
#[utoipa::path(
    patch,
    path = "/api/v1/lots/{id}",
    params(("id" = Uuid, Path, description = "Lot id")),
    request_body = UpdateLotNotesRequest,
    responses(
        (status = 200, description = "Lot updated", body = ApiResponse<LotResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse)
    ),
    tag = "lots"
)]
pub async fn update_lot_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateLotNotesRequest>,
) -> ApiResult<LotResponse> {
    validate_input(&payload)?;
    let lot = state
        .inventory_service
        .update_lot_notes(id, payload.notes)
        .await?;
    Ok(Json(ApiResponse::success(lot)))
}

/// Stock-out draws recorded against a lot
#[utoipa::path(
    get,
    path = "/api/v1/lots/{id}/consumptions",
    params(("id" = Uuid, Path, description = "Lot id")),
    responses(
        (status = 200, description = "Consumptions returned", body = ApiResponse<Vec<LotConsumptionResponse>>),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse)
    ),
    tag = "lots"
)]
pub async fn list_lot_consumptions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<LotConsumptionResponse>> {
    let consumptions = state.inventory_service.lot_consumptions(id).await?;
    Ok(Json(ApiResponse::success(consumptions)))
}
