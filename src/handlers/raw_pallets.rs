use crate::errors::ServiceError;
use crate::models::raw_pallet;
use crate::nztime::RangeUnit;
use crate::services::raw_pallets::{
    RawPalletPage, RawPalletPhotoPage, SaveRawPallet, UpdateRawPallet,
};
use crate::storage;
use crate::{ApiResponse, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "supplier": "Alto Packaging",
    "pallet_no": 48121,
    "stock_code": "RM-220",
    "batch_number": "240815",
    "sticker_date": "2025-08-15"
}))]
pub struct SaveRawPalletRequest {
    pub supplier: Option<String>,
    pub pallet_no: i64,
    pub stock_code: Option<String>,
    #[validate(length(min = 1))]
    pub batch_number: String,
    pub sticker_date: Option<NaiveDate>,
    /// Sticker photo, base64 (optionally a data URL)
    pub photo_base64: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RawPalletListQuery {
    /// Local-time window: day, week or month
    pub range: Option<RangeUnit>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRawPalletRequest {
    pub supplier: Option<String>,
    pub stock_code: Option<String>,
    pub sticker_date: Option<NaiveDate>,
    pub rolls_used: Option<i16>,
}

#[utoipa::path(
    post,
    path = "/api/v1/raw-pallets",
    request_body = SaveRawPalletRequest,
    responses(
        (status = 200, description = "Raw pallet saved (repeat scans upsert)", body = ApiResponse<raw_pallet::Model>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 413, description = "Photo exceeds the size cap", body = crate::errors::ErrorResponse)
    ),
    tag = "raw-pallets"
)]
pub async fn save_raw_pallet(
    State(state): State<AppState>,
    Json(payload): Json<SaveRawPalletRequest>,
) -> ApiResult<raw_pallet::Model> {
    payload.validate().map_err(ServiceError::from)?;
    let photo = payload
        .photo_base64
        .as_deref()
        .map(|raw| storage::decode_image_base64(raw, state.config.max_image_bytes))
        .transpose()?;
    let saved = state
        .raw_pallets
        .save_raw_pallet(SaveRawPallet {
            supplier: payload.supplier,
            pallet_no: payload.pallet_no,
            stock_code: payload.stock_code,
            batch_number: payload.batch_number,
            sticker_date: payload.sticker_date,
            photo,
        })
        .await?;
    Ok(Json(ApiResponse::success(saved)))
}

#[utoipa::path(
    get,
    path = "/api/v1/raw-pallets",
    params(RawPalletListQuery),
    responses(
        (status = 200, description = "Raw pallets in the local-time range", body = ApiResponse<RawPalletPage>),
        (status = 400, description = "Unknown range unit", body = crate::errors::ErrorResponse)
    ),
    tag = "raw-pallets"
)]
pub async fn list_raw_pallets(
    State(state): State<AppState>,
    Query(query): Query<RawPalletListQuery>,
) -> ApiResult<RawPalletPage> {
    let unit = query.range.unwrap_or(RangeUnit::Day);
    let page = state
        .raw_pallets
        .list_range(unit, query.page.max(1), query.limit.clamp(1, 100))
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/raw-pallets/photos",
    params(crate::handlers::PaginationParams),
    responses(
        (status = 200, description = "Photo gallery with public URLs", body = ApiResponse<RawPalletPhotoPage>)
    ),
    tag = "raw-pallets"
)]
pub async fn list_raw_pallet_photos(
    State(state): State<AppState>,
    Query(params): Query<crate::handlers::PaginationParams>,
) -> ApiResult<RawPalletPhotoPage> {
    let (page, limit) = params.clamped();
    let photos = state.raw_pallets.list_photos(page, limit).await?;
    Ok(Json(ApiResponse::success(photos)))
}

#[utoipa::path(
    put,
    path = "/api/v1/raw-pallets/:id",
    params(("id" = Uuid, Path, description = "Raw pallet ID")),
    request_body = UpdateRawPalletRequest,
    responses(
        (status = 200, description = "Raw pallet updated", body = ApiResponse<raw_pallet::Model>),
        (status = 404, description = "Raw pallet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "raw-pallets"
)]
pub async fn update_raw_pallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRawPalletRequest>,
) -> ApiResult<raw_pallet::Model> {
    let updated = state
        .raw_pallets
        .update_raw_pallet(
            id,
            UpdateRawPallet {
                supplier: payload.supplier,
                stock_code: payload.stock_code,
                sticker_date: payload.sticker_date,
                rolls_used: payload.rolls_used,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/raw-pallets/:id",
    params(("id" = Uuid, Path, description = "Raw pallet ID")),
    responses(
        (status = 200, description = "Raw pallet deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Raw pallet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "raw-pallets"
)]
pub async fn delete_raw_pallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.raw_pallets.delete_raw_pallet(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}
