use crate::nztime::Shift;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One produced unit. The ISO serial is unique per product size; the packet
/// is immutable after creation except for pallet reassignment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = Packet)]
#[sea_orm(table_name = "packets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Per-size serial number issued by the atomic counter
    pub iso_number: i64,
    pub size: i32,
    pub thermoformer_number: i16,
    pub shift: Shift,
    pub raw_materials: Option<String>,
    pub batch_number: Option<String>,
    pub box_number: Option<String>,
    pub pallet_id: Option<Uuid>,
    /// Position inside the pallet, 1..=24, unique per pallet
    pub packet_index: Option<i16>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pallet::Entity",
        from = "Column::PalletId",
        to = "super::pallet::Column::Id"
    )]
    Pallet,
}

impl Related<super::pallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pallet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Number of packet positions on a full pallet.
pub const PALLET_CAPACITY: i16 = 24;

/// Number of finished plixies contained in one packet.
pub const PLIXIES_PER_PACKET: u64 = 432;
