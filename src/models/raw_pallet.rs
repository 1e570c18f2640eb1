use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Incoming raw-material stock unit, keyed for upsert by
/// (`batch_number`, `pallet_no`). Each pallet arrives with four rolls;
/// `rolls_used` grows as they are consumed on the floor.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = RawPallet)]
#[sea_orm(table_name = "raw_pallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub supplier: Option<String>,
    pub pallet_no: i64,
    pub stock_code: Option<String>,
    pub batch_number: String,
    pub sticker_date: Option<NaiveDate>,
    pub rolls_total: i16,
    pub rolls_used: i16,
    /// Path of the sticker photo inside the raw-pallets bucket
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Rolls delivered on a fresh raw pallet.
pub const ROLLS_PER_PALLET: i16 = 4;
