//! Initial schema migration.
//!
//! Creates the store tables used by the compliance ledger:
//!
//! - `ship_compliance`: one compliance balance per (ship, year)
//! - `bank_entries`: banked surplus and how much of it has been used
//! - `pools`: append-only pooling events
//! - `pool_members`: per-ship before/after balances of a pool
//! - `routes`: voyage routes with their GHG intensity and baseline flag

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum ShipCompliance {
    Table,
    ShipId,
    Year,
    CbGco2eq,
}

#[derive(Iden)]
enum BankEntries {
    Table,
    Id,
    ShipId,
    Year,
    AmountGco2eq,
    AmountUsed,
    CreatedAt,
}

#[derive(Iden)]
enum Pools {
    Table,
    Id,
    Year,
    CreatedAt,
}

#[derive(Iden)]
enum PoolMembers {
    Table,
    PoolId,
    Position,
    ShipId,
    CbBefore,
    CbAfter,
}

#[derive(Iden)]
enum Routes {
    Table,
    Id,
    RouteId,
    Year,
    VesselType,
    FuelType,
    GhgIntensity,
    FuelConsumptionT,
    DistanceKm,
    TotalEmissionsT,
    IsBaseline,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Compliance records
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ShipCompliance::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ShipCompliance::ShipId).string().not_null())
                    .col(ColumnDef::new(ShipCompliance::Year).integer().not_null())
                    .col(ColumnDef::new(ShipCompliance::CbGco2eq).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(ShipCompliance::ShipId)
                            .col(ShipCompliance::Year),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Bank entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankEntries::ShipId).string().not_null())
                    .col(ColumnDef::new(BankEntries::Year).integer().not_null())
                    .col(
                        ColumnDef::new(BankEntries::AmountGco2eq)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankEntries::AmountUsed)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(BankEntries::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_entries-ship_id-year")
                    .table(BankEntries::Table)
                    .col(BankEntries::ShipId)
                    .col(BankEntries::Year)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Pools
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Pools::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pools::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Pools::Year).integer().not_null())
                    .col(ColumnDef::new(Pools::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pools-year")
                    .table(Pools::Table)
                    .col(Pools::Year)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Pool members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PoolMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PoolMembers::PoolId).string().not_null())
                    .col(ColumnDef::new(PoolMembers::Position).integer().not_null())
                    .col(ColumnDef::new(PoolMembers::ShipId).string().not_null())
                    .col(ColumnDef::new(PoolMembers::CbBefore).double().not_null())
                    .col(ColumnDef::new(PoolMembers::CbAfter).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(PoolMembers::PoolId)
                            .col(PoolMembers::Position),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pool_members-pool_id")
                            .from(PoolMembers::Table, PoolMembers::PoolId)
                            .to(Pools::Table, Pools::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pool_members-ship_id")
                    .table(PoolMembers::Table)
                    .col(PoolMembers::ShipId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Routes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Routes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Routes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Routes::RouteId).string().not_null())
                    .col(ColumnDef::new(Routes::Year).integer().not_null())
                    .col(ColumnDef::new(Routes::VesselType).string())
                    .col(ColumnDef::new(Routes::FuelType).string())
                    .col(ColumnDef::new(Routes::GhgIntensity).double().not_null())
                    .col(ColumnDef::new(Routes::FuelConsumptionT).double())
                    .col(ColumnDef::new(Routes::DistanceKm).double())
                    .col(ColumnDef::new(Routes::TotalEmissionsT).double())
                    .col(
                        ColumnDef::new(Routes::IsBaseline)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-routes-route_id-year-unique")
                    .table(Routes::Table)
                    .col(Routes::RouteId)
                    .col(Routes::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Routes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PoolMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pools::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShipCompliance::Table).to_owned())
            .await?;
        Ok(())
    }
}
