use crate::errors::ServiceError;
use crate::models::pallet_shipment::{self, Destination};
use crate::services::shipments::ShipmentPage;
use crate::{ApiResponse, ApiResult, AppState};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "pallet_id": "990e8400-e29b-41d4-a716-446655440000",
    "location": "Te Puke - Washer Road"
}))]
pub struct AssignShipmentRequest {
    pub pallet_id: Uuid,
    /// One of the six fixed destination strings, matched exactly
    pub location: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    params(crate::handlers::PaginationParams),
    responses(
        (status = 200, description = "Closed pallets with assignments and the destination catalogue", body = ApiResponse<ShipmentPage>)
    ),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(params): Query<crate::handlers::PaginationParams>,
) -> ApiResult<ShipmentPage> {
    let (page, limit) = params.clamped();
    let shipments = state.shipments.list_shipments(page, limit).await?;
    Ok(Json(ApiResponse::success(shipments)))
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    request_body = AssignShipmentRequest,
    responses(
        (status = 200, description = "Destination assigned", body = ApiResponse<pallet_shipment::Model>),
        (status = 400, description = "Destination outside the fixed list", body = crate::errors::ErrorResponse),
        (status = 404, description = "Pallet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn assign_shipment(
    State(state): State<AppState>,
    Json(payload): Json<AssignShipmentRequest>,
) -> ApiResult<pallet_shipment::Model> {
    let destination = Destination::from_str(&payload.location)
        .map_err(ServiceError::ValidationError)?;
    let assigned = state
        .shipments
        .assign_destination(payload.pallet_id, destination)
        .await?;
    Ok(Json(ApiResponse::success(assigned)))
}
