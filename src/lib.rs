/*!
Backend for a thermoforming factory floor: packet serials, pallet
placement, raw-material intake, shipment destinations, dashboard stats,
label OCR and a production chat assistant.
*/

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod llm;
pub mod migrator;
pub mod models;
pub mod nztime;
pub mod openapi;
pub mod services;
pub mod storage;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::llm::LlmClient;
use crate::services::chat::ChatService;
use crate::services::ocr::OcrService;
use crate::services::packets::PacketService;
use crate::services::pallets::PalletService;
use crate::services::raw_pallets::RawPalletService;
use crate::services::rolls::RollService;
use crate::services::shipments::ShipmentService;
use crate::services::stats::StatsService;
use crate::storage::StorageClient;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub packets: PacketService,
    pub pallets: PalletService,
    pub shipments: ShipmentService,
    pub raw_pallets: RawPalletService,
    pub rolls: RollService,
    pub stats: StatsService,
    pub chat: ChatService,
    ocr: Option<OcrService>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Result<Self, ServiceError> {
        let storage = StorageClient::from_config(&config)?;
        let llm = config.openai_api_key.as_deref().map(LlmClient::new);
        let ocr = llm
            .clone()
            .map(|client| OcrService::new(client, config.max_image_bytes));

        Ok(Self {
            packets: PacketService::new(db.clone()),
            pallets: PalletService::new(db.clone()),
            shipments: ShipmentService::new(db.clone()),
            raw_pallets: RawPalletService::new(db.clone(), storage.clone()),
            rolls: RollService::new(db.clone(), storage),
            stats: StatsService::new(db.clone()),
            chat: ChatService::new(db.clone(), llm),
            ocr,
            db,
            config,
        })
    }

    pub fn ocr(&self) -> Result<&OcrService, ServiceError> {
        self.ocr.as_ref().ok_or_else(|| {
            ServiceError::ExternalServiceError("label OCR is not configured".to_string())
        })
    }
}

/// Envelope for every successful JSON response.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/packets",
            post(handlers::packets::create_packet).get(handlers::packets::list_packets),
        )
        .route(
            "/packets/:id",
            get(handlers::packets::get_packet).delete(handlers::packets::delete_packet),
        )
        .route(
            "/pallets",
            get(handlers::pallets::list_pallets).post(handlers::pallets::create_pallet),
        )
        .route(
            "/pallets/:id",
            axum::routing::put(handlers::pallets::update_pallet)
                .delete(handlers::pallets::delete_pallet),
        )
        .route(
            "/shipments",
            get(handlers::shipments::list_shipments).post(handlers::shipments::assign_shipment),
        )
        .route(
            "/raw-pallets",
            post(handlers::raw_pallets::save_raw_pallet)
                .get(handlers::raw_pallets::list_raw_pallets),
        )
        .route(
            "/raw-pallets/photos",
            get(handlers::raw_pallets::list_raw_pallet_photos),
        )
        .route(
            "/raw-pallets/:id",
            axum::routing::put(handlers::raw_pallets::update_raw_pallet)
                .delete(handlers::raw_pallets::delete_raw_pallet),
        )
        .route(
            "/rolls",
            post(handlers::rolls::save_roll).get(handlers::rolls::list_rolls),
        )
        .route(
            "/rolls/:id",
            axum::routing::delete(handlers::rolls::delete_roll),
        )
        .route("/stats", get(handlers::stats::get_stats))
        .route("/stats/table", get(handlers::stats::get_stats_table))
        .route("/stats/home", get(handlers::stats::get_home_stats))
        .route("/stats/sizes", get(handlers::stats::get_size_stats))
        .route("/ocr/roll-label", post(handlers::ocr::read_roll_label))
        .route("/ocr/pallet-label", post(handlers::ocr::read_pallet_label))
        .route("/chat", post(handlers::chat::chat))
        .route("/chat/query", post(handlers::chat::chat_query))
        .route("/status", get(api_status))
        .route("/health", get(health_check))
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "plixies-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };
    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}
