use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Container for up to 24 packets. `closed_at` is written when position 24
/// fills, but completion is always recomputed from packet positions on the
/// read side rather than trusted from this column.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = Pallet)]
#[sea_orm(table_name = "pallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Global sequence issued by the atomic pallet counter
    pub pallet_number: i64,
    pub size: i32,
    pub thermoformer_number: i16,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::packet::Entity")]
    Packets,
    #[sea_orm(has_one = "super::pallet_shipment::Entity")]
    Shipment,
}

impl Related<super::packet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Packets.def()
    }
}

impl Related<super::pallet_shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
