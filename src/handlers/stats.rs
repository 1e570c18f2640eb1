use crate::models::packet;
use crate::nztime::{RangeUnit, Shift};
use crate::services::stats::{HomeStats, SizeStats, StatsFilter, StatsSummary};
use crate::{ApiResponse, ApiResult, AppState};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Local-time window: day, week or month
    pub range: Option<RangeUnit>,
    /// Restrict to one thermoformer
    pub thermo: Option<i16>,
    /// Restrict to one size
    pub size: Option<i32>,
    /// Restrict to one shift (DS, TW, NS)
    pub shift: Option<Shift>,
}

impl StatsQuery {
    fn filter(&self) -> StatsFilter {
        StatsFilter {
            thermoformer_number: self.thermo,
            size: self.size,
            shift: self.shift,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "KPI counts and hourly histogram", body = ApiResponse<StatsSummary>),
        (status = 400, description = "Unknown range unit", body = crate::errors::ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<StatsSummary> {
    let unit = query.range.unwrap_or(RangeUnit::Day);
    let summary = state.stats.summary(unit, query.filter()).await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/table",
    params(StatsQuery),
    responses(
        (status = 200, description = "Packet rows for the range", body = ApiResponse<Vec<packet::Model>>)
    ),
    tag = "stats"
)]
pub async fn get_stats_table(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Vec<packet::Model>> {
    let unit = query.range.unwrap_or(RangeUnit::Day);
    let rows = state.stats.table(unit, query.filter()).await?;
    Ok(Json(ApiResponse::success(rows)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/home",
    responses(
        (status = 200, description = "Current shift progress and 24 h trend", body = ApiResponse<HomeStats>)
    ),
    tag = "stats"
)]
pub async fn get_home_stats(State(state): State<AppState>) -> ApiResult<HomeStats> {
    let home = state.stats.home().await?;
    Ok(Json(ApiResponse::success(home)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/sizes",
    responses(
        (status = 200, description = "Today's packet counts and latest serial per size", body = ApiResponse<Vec<SizeStats>>)
    ),
    tag = "stats"
)]
pub async fn get_size_stats(State(state): State<AppState>) -> ApiResult<Vec<SizeStats>> {
    let sizes = state.stats.sizes().await?;
    Ok(Json(ApiResponse::success(sizes)))
}
