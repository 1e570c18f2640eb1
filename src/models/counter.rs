use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-size ISO serial counters. One row per product size; `last_value` is
/// only ever advanced through an atomic `UPDATE .. RETURNING`.
pub mod iso {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "iso_counters")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub size: i32,
        pub last_value: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Global pallet-number counter. A single row with id = 1.
pub mod pallet {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "pallet_counters")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub last_value: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
