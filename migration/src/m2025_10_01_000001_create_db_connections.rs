//! Migration to create the db_connections table.
//!
//! Stores one connection profile per remote SQL Server target. Display names
//! are unique only among rows that are not soft-deleted, so the index on
//! `server_name` is a plain lookup index and uniqueness is checked by the
//! repository.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DbConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbConnections::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DbConnections::ServerName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DbConnections::Host).string_len(255).not_null())
                    .col(
                        ColumnDef::new(DbConnections::Port)
                            .integer()
                            .not_null()
                            .default(1433),
                    )
                    .col(
                        ColumnDef::new(DbConnections::DatabaseName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DbConnections::Username)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DbConnections::Password)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DbConnections::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(DbConnections::Description).text().null())
                    .col(
                        ColumnDef::new(DbConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DbConnections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DbConnections::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_db_connections_server_name")
                    .table(DbConnections::Table)
                    .col(DbConnections::ServerName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_db_connections_deleted_at")
                    .table(DbConnections::Table)
                    .col(DbConnections::DeletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_db_connections_server_name")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_db_connections_deleted_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DbConnections::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DbConnections {
    Table,
    Id,
    ServerName,
    Host,
    Port,
    DatabaseName,
    Username,
    Password,
    IsActive,
    Description,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
