use crate::errors::ServiceError;
use crate::services::ocr::{PalletLabel, RollLabel};
use crate::{ApiResponse, ApiResult, AppState};
use axum::{extract::State, response::Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OcrRequest {
    /// Label photo, base64 (optionally a data URL). Capped in size; an
    /// oversized image is rejected before anything is sent upstream.
    #[validate(length(min = 1))]
    pub image_base64: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/ocr/roll-label",
    request_body = OcrRequest,
    responses(
        (status = 200, description = "Fields read off the roll label", body = ApiResponse<RollLabel>),
        (status = 413, description = "Image exceeds the size cap", body = crate::errors::ErrorResponse),
        (status = 502, description = "Vision model unavailable or returned non-JSON", body = crate::errors::ErrorResponse)
    ),
    tag = "ocr"
)]
pub async fn read_roll_label(
    State(state): State<AppState>,
    Json(payload): Json<OcrRequest>,
) -> ApiResult<RollLabel> {
    payload.validate().map_err(ServiceError::from)?;
    let label = state.ocr()?.read_roll_label(&payload.image_base64).await?;
    Ok(Json(ApiResponse::success(label)))
}

#[utoipa::path(
    post,
    path = "/api/v1/ocr/pallet-label",
    request_body = OcrRequest,
    responses(
        (status = 200, description = "Fields read off the pallet sticker", body = ApiResponse<PalletLabel>),
        (status = 413, description = "Image exceeds the size cap", body = crate::errors::ErrorResponse),
        (status = 502, description = "Vision model unavailable or returned non-JSON", body = crate::errors::ErrorResponse)
    ),
    tag = "ocr"
)]
pub async fn read_pallet_label(
    State(state): State<AppState>,
    Json(payload): Json<OcrRequest>,
) -> ApiResult<PalletLabel> {
    payload.validate().map_err(ServiceError::from)?;
    let label = state.ocr()?.read_pallet_label(&payload.image_base64).await?;
    Ok(Json(ApiResponse::success(label)))
}
