//! Database migrations for the invoice gateway's local metadata store.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_10_01_000001_create_db_connections;
mod m2025_10_01_000002_create_db_codigo_producto;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_10_01_000001_create_db_connections::Migration),
            Box::new(m2025_10_01_000002_create_db_codigo_producto::Migration),
        ]
    }
}
