use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_catalog_tables::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Packs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Packs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Packs::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Packs::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Packs::Description).text())
                    .col(ColumnDef::new(Packs::MainImage).text())
                    .col(ColumnDef::new(Packs::Price).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Packs::DiscountPercentage)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(Packs::ShowInMenu)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Packs::ProductSamId).uuid().not_null())
                    .col(ColumnDef::new(Packs::ProductCacId).uuid().not_null())
                    .col(ColumnDef::new(Packs::ProductSalonId).uuid().not_null())
                    .col(
                        ColumnDef::new(Packs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Packs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_packs_product_sam_id")
                            .from(Packs::Table, Packs::ProductSamId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_packs_product_cac_id")
                            .from(Packs::Table, Packs::ProductCacId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_packs_product_salon_id")
                            .from(Packs::Table, Packs::ProductSalonId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Packs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Packs {
    Table,
    Id,
    Name,
    Slug,
    Description,
    MainImage,
    Price,
    DiscountPercentage,
    ShowInMenu,
    ProductSamId,
    ProductCacId,
    ProductSalonId,
    CreatedAt,
    UpdatedAt,
}
