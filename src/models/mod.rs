pub mod counter;
pub mod packet;
pub mod pallet;
pub mod pallet_shipment;
pub mod raw_pallet;
pub mod roll;
pub mod sizes;
