use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plixies API",
        version = "0.3.0",
        description = r#"
Backend for the thermoforming factory floor.

Records production packets with per-size ISO serials, places them on pallets
(24 slots), tracks raw-material intake (raw pallets and rolls), assigns
shipment destinations to closed pallets, serves dashboard statistics, reads
label photos with a vision model and answers production questions over a
streaming chat.

All date filters (`range=day|week|month`) are evaluated in Pacific/Auckland
civil time and converted to half-open UTC ranges, so days around DST
transitions span 23 or 25 hours.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "packets", description = "Production packet recording"),
        (name = "pallets", description = "Pallet lifecycle and completion"),
        (name = "shipments", description = "Destination assignment for closed pallets"),
        (name = "raw-pallets", description = "Raw-material pallet intake"),
        (name = "rolls", description = "Roll intake scanning"),
        (name = "stats", description = "Dashboard statistics"),
        (name = "ocr", description = "Label photo extraction"),
        (name = "chat", description = "Production assistant")
    ),
    paths(
        crate::handlers::packets::create_packet,
        crate::handlers::packets::list_packets,
        crate::handlers::packets::get_packet,
        crate::handlers::packets::delete_packet,
        crate::handlers::pallets::list_pallets,
        crate::handlers::pallets::create_pallet,
        crate::handlers::pallets::update_pallet,
        crate::handlers::pallets::delete_pallet,
        crate::handlers::shipments::list_shipments,
        crate::handlers::shipments::assign_shipment,
        crate::handlers::raw_pallets::save_raw_pallet,
        crate::handlers::raw_pallets::list_raw_pallets,
        crate::handlers::raw_pallets::list_raw_pallet_photos,
        crate::handlers::raw_pallets::update_raw_pallet,
        crate::handlers::raw_pallets::delete_raw_pallet,
        crate::handlers::rolls::save_roll,
        crate::handlers::rolls::list_rolls,
        crate::handlers::rolls::delete_roll,
        crate::handlers::stats::get_stats,
        crate::handlers::stats::get_stats_table,
        crate::handlers::stats::get_home_stats,
        crate::handlers::stats::get_size_stats,
        crate::handlers::ocr::read_roll_label,
        crate::handlers::ocr::read_pallet_label,
        crate::handlers::chat::chat,
        crate::handlers::chat::chat_query,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,
            crate::nztime::RangeUnit,
            crate::nztime::Shift,
            crate::models::pallet_shipment::Destination,
            crate::models::pallet::Model,
            crate::handlers::packets::CreatePacketRequest,
            crate::handlers::pallets::CreatePalletRequest,
            crate::handlers::pallets::UpdatePalletRequest,
            crate::handlers::shipments::AssignShipmentRequest,
            crate::handlers::raw_pallets::SaveRawPalletRequest,
            crate::handlers::raw_pallets::UpdateRawPalletRequest,
            crate::handlers::rolls::SaveRollRequest,
            crate::handlers::ocr::OcrRequest,
            crate::handlers::chat::ChatRequest,
            crate::handlers::chat::ChatQueryRequest,
            crate::handlers::chat::ChatQueryResponse,
            crate::services::packets::PacketPlacement,
            crate::services::pallets::PalletAggregate,
            crate::services::pallets::PalletView,
            crate::services::pallets::PalletPage,
            crate::services::shipments::ShipmentView,
            crate::services::shipments::ShipmentPage,
            crate::services::raw_pallets::RawPalletPage,
            crate::services::raw_pallets::RawPalletPhoto,
            crate::services::raw_pallets::RawPalletPhotoPage,
            crate::services::rolls::SavedRoll,
            crate::services::rolls::RollView,
            crate::services::stats::StatsSummary,
            crate::services::stats::HourBucket,
            crate::services::stats::HomeStats,
            crate::services::stats::ThermoformerProgress,
            crate::services::stats::SizeStats,
            crate::services::ocr::RollLabel,
            crate::services::ocr::PalletLabel,
            crate::services::chat::Language,
            crate::llm::ChatTurn,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_the_api() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Plixies API"));
        assert!(json.contains("/api/v1/packets"));
        assert!(json.contains("/api/v1/shipments"));
        assert!(json.contains("/api/v1/chat"));
        // Entity-backed schemas render their timestamp fields.
        assert!(json.contains("\"created_at\""));
        assert!(json.contains("\"opened_at\""));
        assert!(json.contains("\"assigned_at\""));
        assert!(json.contains("\"sticker_date\""));
    }
}
