//! Migration to create the db_codigo_producto table.
//!
//! Static lookup of product codes and their descriptions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DbCodigoProducto::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbCodigoProducto::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DbCodigoProducto::Codigo).text().not_null())
                    .col(ColumnDef::new(DbCodigoProducto::Descripcion).text().not_null())
                    .col(
                        ColumnDef::new(DbCodigoProducto::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DbCodigoProducto::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DbCodigoProducto::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_db_codigo_producto_codigo")
                    .table(DbCodigoProducto::Table)
                    .col(DbCodigoProducto::Codigo)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_db_codigo_producto_codigo")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DbCodigoProducto::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DbCodigoProducto {
    Table,
    Id,
    Codigo,
    Descripcion,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
