use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_pallets_table::Migration),
            Box::new(m20250101_000002_create_packets_table::Migration),
            Box::new(m20250101_000003_create_counters_tables::Migration),
            Box::new(m20250101_000004_create_raw_pallets_table::Migration),
            Box::new(m20250101_000005_create_rolls_table::Migration),
            Box::new(m20250101_000006_create_pallet_shipments_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_pallets_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_pallets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Pallets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Pallets::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Pallets::PalletNumber)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Pallets::Size).integer().not_null())
                        .col(
                            ColumnDef::new(Pallets::ThermoformerNumber)
                                .small_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Pallets::OpenedAt).timestamp().not_null())
                        .col(ColumnDef::new(Pallets::ClosedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pallets_pallet_number")
                        .table(Pallets::Table)
                        .col(Pallets::PalletNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pallets_size_thermo")
                        .table(Pallets::Table)
                        .col(Pallets::Size)
                        .col(Pallets::ThermoformerNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Pallets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Pallets {
        Table,
        Id,
        PalletNumber,
        Size,
        ThermoformerNumber,
        OpenedAt,
        ClosedAt,
    }
}

mod m20250101_000002_create_packets_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_packets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Packets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Packets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Packets::IsoNumber).big_integer().not_null())
                        .col(ColumnDef::new(Packets::Size).integer().not_null())
                        .col(
                            ColumnDef::new(Packets::ThermoformerNumber)
                                .small_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Packets::Shift).text().not_null())
                        .col(ColumnDef::new(Packets::RawMaterials).string().null())
                        .col(ColumnDef::new(Packets::BatchNumber).string().null())
                        .col(ColumnDef::new(Packets::BoxNumber).string().null())
                        .col(ColumnDef::new(Packets::PalletId).uuid().null())
                        .col(ColumnDef::new(Packets::PacketIndex).small_integer().null())
                        .col(ColumnDef::new(Packets::UserId).string().null())
                        .col(ColumnDef::new(Packets::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_packets_pallet_id")
                                .from(Packets::Table, Packets::PalletId)
                                .to(
                                    super::m20250101_000001_create_pallets_table::Pallets::Table,
                                    super::m20250101_000001_create_pallets_table::Pallets::Id,
                                )
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            // One serial per size
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_packets_size_iso_number")
                        .table(Packets::Table)
                        .col(Packets::Size)
                        .col(Packets::IsoNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // One packet per slot on a pallet
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_packets_pallet_position")
                        .table(Packets::Table)
                        .col(Packets::PalletId)
                        .col(Packets::PacketIndex)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_packets_created_at")
                        .table(Packets::Table)
                        .col(Packets::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Packets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Packets {
        Table,
        Id,
        IsoNumber,
        Size,
        ThermoformerNumber,
        Shift,
        RawMaterials,
        BatchNumber,
        BoxNumber,
        PalletId,
        PacketIndex,
        UserId,
        CreatedAt,
    }
}

mod m20250101_000003_create_counters_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_counters_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(IsoCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IsoCounters::Size)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IsoCounters::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PalletCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PalletCounters::Id)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PalletCounters::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            // Seed one counter row per supported size and the pallet singleton.
            for size in [22, 25, 27, 30] {
                manager
                    .exec_stmt(
                        Query::insert()
                            .into_table(IsoCounters::Table)
                            .columns([IsoCounters::Size, IsoCounters::LastValue])
                            .values_panic([size.into(), 0.into()])
                            .on_conflict(
                                OnConflict::column(IsoCounters::Size)
                                    .do_nothing()
                                    .to_owned(),
                            )
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(PalletCounters::Table)
                        .columns([PalletCounters::Id, PalletCounters::LastValue])
                        .values_panic([1.into(), 0.into()])
                        .on_conflict(
                            OnConflict::column(PalletCounters::Id)
                                .do_nothing()
                                .to_owned(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(IsoCounters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PalletCounters::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum IsoCounters {
        Table,
        Size,
        LastValue,
    }

    #[derive(DeriveIden)]
    enum PalletCounters {
        Table,
        Id,
        LastValue,
    }
}

mod m20250101_000004_create_raw_pallets_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_raw_pallets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RawPallets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RawPallets::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RawPallets::Supplier).string().null())
                        .col(
                            ColumnDef::new(RawPallets::PalletNo)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RawPallets::StockCode).string().null())
                        .col(ColumnDef::new(RawPallets::BatchNumber).string().not_null())
                        .col(ColumnDef::new(RawPallets::StickerDate).date().null())
                        .col(
                            ColumnDef::new(RawPallets::RollsTotal)
                                .small_integer()
                                .not_null()
                                .default(4),
                        )
                        .col(
                            ColumnDef::new(RawPallets::RollsUsed)
                                .small_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RawPallets::PhotoPath).string().null())
                        .col(ColumnDef::new(RawPallets::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // Upsert key for repeated scans of the same sticker
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_raw_pallets_batch_pallet_no")
                        .table(RawPallets::Table)
                        .col(RawPallets::BatchNumber)
                        .col(RawPallets::PalletNo)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_raw_pallets_created_at")
                        .table(RawPallets::Table)
                        .col(RawPallets::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RawPallets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RawPallets {
        Table,
        Id,
        Supplier,
        PalletNo,
        StockCode,
        BatchNumber,
        StickerDate,
        RollsTotal,
        RollsUsed,
        PhotoPath,
        CreatedAt,
    }
}

mod m20250101_000005_create_rolls_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_rolls_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Rolls::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Rolls::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Rolls::ThermoformerNumber)
                                .small_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Rolls::RawMaterials).string().not_null())
                        .col(ColumnDef::new(Rolls::BatchNumber).string().not_null())
                        .col(ColumnDef::new(Rolls::BoxNumber).string().not_null())
                        .col(ColumnDef::new(Rolls::PhotoPath).string().null())
                        .col(ColumnDef::new(Rolls::UserId).string().null())
                        .col(ColumnDef::new(Rolls::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_rolls_created_at")
                        .table(Rolls::Table)
                        .col(Rolls::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Rolls::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Rolls {
        Table,
        Id,
        ThermoformerNumber,
        RawMaterials,
        BatchNumber,
        BoxNumber,
        PhotoPath,
        UserId,
        CreatedAt,
    }
}

mod m20250101_000006_create_pallet_shipments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000006_create_pallet_shipments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PalletShipments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PalletShipments::PalletId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PalletShipments::Location).text().not_null())
                        .col(
                            ColumnDef::new(PalletShipments::AssignedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pallet_shipments_pallet_id")
                                .from(PalletShipments::Table, PalletShipments::PalletId)
                                .to(
                                    super::m20250101_000001_create_pallets_table::Pallets::Table,
                                    super::m20250101_000001_create_pallets_table::Pallets::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PalletShipments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PalletShipments {
        Table,
        PalletId,
        Location,
        AssignedAt,
    }
}
