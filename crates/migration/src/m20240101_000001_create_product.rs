//! Create `product` table.
//!
//! Prices are stored in minor units (cents); includes soft-delete timestamp.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(string_len(Product::Id, 32).primary_key())
                    // uniqueness only applies to live rows; see the partial index migration
                    .col(string_len(Product::Sku, 50).not_null())
                    .col(string_len(Product::Name, 200).not_null())
                    .col(ColumnDef::new(Product::Description).text().null())
                    .col(big_integer(Product::PriceMinor).not_null())
                    .col(integer(Product::CategoryId).not_null())
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    // Explicitly define nullable timestamps to avoid conflicting NULL/NOT NULL
                    .col(
                        ColumnDef::new(Product::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Product::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product { Table, Id, Sku, Name, Description, PriceMinor, CategoryId, CreatedAt, UpdatedAt, DeletedAt }
