use crate::errors::ServiceError;
use crate::models::packet;
use crate::nztime::Shift;
use crate::services::packets::{CreatePacket, PacketPlacement};
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
    "size": 25,
    "thermoformer_number": 1,
    "shift": "DS",
    "batch_number": "240811",
    "box_number": "17"
}))]
pub struct CreatePacketRequest {
    /// Product size (22, 25, 27 or 30)
    pub size: i32,
    /// Thermoformer the packet came off (1 or 2)
    #[validate(range(min = 1, max = 2))]
    pub thermoformer_number: i16,
    /// Shift the packet belongs to (DS, TW or NS); computed from the
    /// factory clock when omitted
    pub shift: Option<Shift>,
    pub raw_materials: Option<String>,
    pub batch_number: Option<String>,
    pub box_number: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentPacketsQuery {
    pub limit: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/packets",
    request_body = CreatePacketRequest,
    responses(
        (status = 200, description = "Packet recorded with serial and pallet slot", body = ApiResponse<PacketPlacement>),
        (status = 400, description = "Invalid size or thermoformer", body = crate::errors::ErrorResponse)
    ),
    tag = "packets"
)]
pub async fn create_packet(
    State(state): State<AppState>,
    Json(payload): Json<CreatePacketRequest>,
) -> ApiResult<PacketPlacement> {
    payload.validate().map_err(ServiceError::from)?;
    let placement = state
        .packets
        .create_packet(CreatePacket {
            size: payload.size,
            thermoformer_number: payload.thermoformer_number,
            shift: payload.shift,
            raw_materials: payload.raw_materials,
            batch_number: payload.batch_number,
            box_number: payload.box_number,
            user_id: payload.user_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(placement)))
}

#[utoipa::path(
    get,
    path = "/api/v1/packets",
    params(RecentPacketsQuery),
    responses(
        (status = 200, description = "Recent packets, newest first", body = ApiResponse<Vec<packet::Model>>)
    ),
    tag = "packets"
)]
pub async fn list_packets(
    State(state): State<AppState>,
    Query(query): Query<RecentPacketsQuery>,
) -> ApiResult<Vec<packet::Model>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let packets = state.packets.list_recent(limit).await?;
    Ok(Json(ApiResponse::success(packets)))
}

#[utoipa::path(
    get,
    path = "/api/v1/packets/:id",
    params(("id" = Uuid, Path, description = "Packet ID")),
    responses(
        (status = 200, description = "Packet fetched", body = ApiResponse<packet::Model>),
        (status = 404, description = "Packet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "packets"
)]
pub async fn get_packet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<packet::Model> {
    let found = state.packets.get_packet(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/packets/:id",
    params(("id" = Uuid, Path, description = "Packet ID")),
    responses(
        (status = 200, description = "Packet deleted; its pallet reopens", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Packet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "packets"
)]
pub async fn delete_packet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.packets.delete_packet(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_is_optional_and_strictly_coded() {
        let req: CreatePacketRequest =
            serde_json::from_str(r#"{"size":25,"thermoformer_number":1}"#).unwrap();
        assert!(req.shift.is_none());

        let req: CreatePacketRequest =
            serde_json::from_str(r#"{"size":25,"thermoformer_number":1,"shift":"NS"}"#).unwrap();
        assert_eq!(req.shift, Some(Shift::Night));

        assert!(serde_json::from_str::<CreatePacketRequest>(
            r#"{"size":25,"thermoformer_number":1,"shift":"night"}"#
        )
        .is_err());
    }
}
