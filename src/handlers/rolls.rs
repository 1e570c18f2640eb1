use crate::errors::ServiceError;
use crate::nztime::RangeUnit;
use crate::services::rolls::{RollView, SaveRoll, SavedRoll};
use crate::storage;
use crate::{ApiResponse, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "thermoformer_number": 1,
    "raw_materials": "PET 0.5mm clear",
    "batch_number": "240815",
    "box_number": "3"
}))]
pub struct SaveRollRequest {
    #[validate(range(min = 1, max = 2))]
    pub thermoformer_number: i16,
    #[validate(length(min = 1))]
    pub raw_materials: String,
    #[validate(length(min = 1))]
    pub batch_number: String,
    #[validate(length(min = 1))]
    pub box_number: String,
    /// Label photo, base64 (optionally a data URL)
    pub photo_base64: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RollListQuery {
    /// Local-time window: day, week or month
    pub range: Option<RangeUnit>,
}

#[utoipa::path(
    post,
    path = "/api/v1/rolls",
    request_body = SaveRollRequest,
    responses(
        (status = 200, description = "Roll recorded", body = ApiResponse<SavedRoll>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 413, description = "Photo exceeds the size cap", body = crate::errors::ErrorResponse)
    ),
    tag = "rolls"
)]
pub async fn save_roll(
    State(state): State<AppState>,
    Json(payload): Json<SaveRollRequest>,
) -> ApiResult<SavedRoll> {
    payload.validate().map_err(ServiceError::from)?;
    let photo = payload
        .photo_base64
        .as_deref()
        .map(|raw| storage::decode_image_base64(raw, state.config.max_image_bytes))
        .transpose()?;
    let saved = state
        .rolls
        .save_roll(SaveRoll {
            thermoformer_number: payload.thermoformer_number,
            raw_materials: payload.raw_materials,
            batch_number: payload.batch_number,
            box_number: payload.box_number,
            photo,
            user_id: payload.user_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(saved)))
}

#[utoipa::path(
    get,
    path = "/api/v1/rolls",
    params(RollListQuery),
    responses(
        (status = 200, description = "Rolls in the local-time range with signed photo URLs", body = ApiResponse<Vec<RollView>>),
        (status = 400, description = "Unknown range unit", body = crate::errors::ErrorResponse)
    ),
    tag = "rolls"
)]
pub async fn list_rolls(
    State(state): State<AppState>,
    Query(query): Query<RollListQuery>,
) -> ApiResult<Vec<RollView>> {
    let unit = query.range.unwrap_or(RangeUnit::Day);
    let rolls = state.rolls.list_range(unit).await?;
    Ok(Json(ApiResponse::success(rolls)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rolls/:id",
    params(("id" = Uuid, Path, description = "Roll ID")),
    responses(
        (status = 200, description = "Roll deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Roll not found", body = crate::errors::ErrorResponse)
    ),
    tag = "rolls"
)]
pub async fn delete_roll(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.rolls.delete_roll(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}
