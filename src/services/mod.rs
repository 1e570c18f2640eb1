pub mod chat;
pub mod counters;
pub mod ocr;
pub mod packets;
pub mod pallets;
pub mod raw_pallets;
pub mod rolls;
pub mod shipments;
pub mod stats;
