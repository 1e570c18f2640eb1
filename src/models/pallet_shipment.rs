use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed catalogue of shipment destinations, stored as the exact address
/// string. Anything outside this list is rejected at the boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Destination {
    #[sea_orm(string_value = "Te Puke - Washer Road")]
    #[serde(rename = "Te Puke - Washer Road")]
    TePukeWasherRoad,
    #[sea_orm(string_value = "Te Puke - Collins Lane")]
    #[serde(rename = "Te Puke - Collins Lane")]
    TePukeCollinsLane,
    #[sea_orm(string_value = "Te Puke - Quarry Road")]
    #[serde(rename = "Te Puke - Quarry Road")]
    TePukeQuarryRoad,
    #[sea_orm(string_value = "Katikati - Marshall Road")]
    #[serde(rename = "Katikati - Marshall Road")]
    KatikatiMarshallRoad,
    #[sea_orm(string_value = "Edgecumbe - East Bank Road")]
    #[serde(rename = "Edgecumbe - East Bank Road")]
    EdgecumbeEastBankRoad,
    #[sea_orm(string_value = "Opotiki - Stoney Creek Road")]
    #[serde(rename = "Opotiki - Stoney Creek Road")]
    OpotikiStoneyCreekRoad,
}

impl Destination {
    pub const ALL: [Destination; 6] = [
        Destination::TePukeWasherRoad,
        Destination::TePukeCollinsLane,
        Destination::TePukeQuarryRoad,
        Destination::KatikatiMarshallRoad,
        Destination::EdgecumbeEastBankRoad,
        Destination::OpotikiStoneyCreekRoad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::TePukeWasherRoad => "Te Puke - Washer Road",
            Destination::TePukeCollinsLane => "Te Puke - Collins Lane",
            Destination::TePukeQuarryRoad => "Te Puke - Quarry Road",
            Destination::KatikatiMarshallRoad => "Katikati - Marshall Road",
            Destination::EdgecumbeEastBankRoad => "Edgecumbe - East Bank Road",
            Destination::OpotikiStoneyCreekRoad => "Opotiki - Stoney Creek Road",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Destination::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown destination '{}'", s))
    }
}

/// Maps a closed pallet to its destination site; at most one row per pallet.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = PalletShipment)]
#[sea_orm(table_name = "pallet_shipments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub pallet_id: Uuid,
    pub location: Destination,
    pub assigned_at: DateTime<Utc>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_round_trips_exact_strings() {
        for d in Destination::ALL {
            assert_eq!(Destination::from_str(d.as_str()).unwrap(), d);
        }
    }

    #[test]
    fn destination_rejects_unknown_and_near_misses() {
        assert!(Destination::from_str("Hamilton - Main Street").is_err());
        assert!(Destination::from_str("te puke - washer road").is_err());
        assert!(Destination::from_str("").is_err());
    }
}
