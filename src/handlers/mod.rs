pub mod chat;
pub mod ocr;
pub mod packets;
pub mod pallets;
pub mod raw_pallets;
pub mod rolls;
pub mod shipments;
pub mod stats;

use serde::Deserialize;
use utoipa::IntoParams;

/// Pagination parameters shared by list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
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

impl PaginationParams {
    pub fn clamped(&self) -> (u64, u64) {
        (self.page.max(1), self.limit.clamp(1, 100))
    }
}
