use crate::errors::ServiceError;
use crate::models::pallet;
use crate::services::pallets::{PalletPage, UpdatePallet};
use crate::{ApiResponse, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "size": 25, "thermoformer_number": 2 }))]
pub struct CreatePalletRequest {
    pub size: i32,
    #[validate(range(min = 1, max = 2))]
    pub thermoformer_number: i16,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePalletRequest {
    pub size: Option<i32>,
    pub thermoformer_number: Option<i16>,
}

#[utoipa::path(
    get,
    path = "/api/v1/pallets",
    params(crate::handlers::PaginationParams),
    responses(
        (status = 200, description = "Pallets newest-first with completion aggregates", body = ApiResponse<PalletPage>)
    ),
    tag = "pallets"
)]
pub async fn list_pallets(
    State(state): State<AppState>,
    Query(params): Query<crate::handlers::PaginationParams>,
) -> ApiResult<PalletPage> {
    let (page, limit) = params.clamped();
    let pallets = state.pallets.list_pallets(page, limit).await?;
    Ok(Json(ApiResponse::success(pallets)))
}

#[utoipa::path(
    post,
    path = "/api/v1/pallets",
    request_body = CreatePalletRequest,
    responses(
        (status = 200, description = "Empty pallet opened", body = ApiResponse<pallet::Model>),
        (status = 400, description = "Invalid size or thermoformer", body = crate::errors::ErrorResponse)
    ),
    tag = "pallets"
)]
pub async fn create_pallet(
    State(state): State<AppState>,
    Json(payload): Json<CreatePalletRequest>,
) -> ApiResult<pallet::Model> {
    payload.validate().map_err(ServiceError::from)?;
    let created = state
        .pallets
        .create_pallet(payload.size, payload.thermoformer_number)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/pallets/:id",
    params(("id" = Uuid, Path, description = "Pallet ID")),
    request_body = UpdatePalletRequest,
    responses(
        (status = 200, description = "Pallet patched along with its packets", body = ApiResponse<pallet::Model>),
        (status = 404, description = "Pallet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pallets"
)]
pub async fn update_pallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePalletRequest>,
) -> ApiResult<pallet::Model> {
    let updated = state
        .pallets
        .update_pallet(
            id,
            UpdatePallet {
                size: payload.size,
                thermoformer_number: payload.thermoformer_number,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/pallets/:id",
    params(("id" = Uuid, Path, description = "Pallet ID")),
    responses(
        (status = 200, description = "Pallet deleted, packets detached", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Pallet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "pallets"
)]
pub async fn delete_pallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.pallets.delete_pallet(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}
