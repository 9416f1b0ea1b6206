//! Connection profile entity model
//!
//! This module contains the SeaORM entity model for the db_connections table,
//! where each row describes how to reach one remote SQL Server instance.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::remote::ConnectionTarget;

/// Default SQL Server port used when a profile does not specify one.
pub const DEFAULT_PORT: i32 = 1433;

/// Connection profile pointing at a remote SQL Server holding invoice data
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "db_connections")]
pub struct Model {
    /// Surrogate key
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name, unique among rows that are not soft-deleted
    pub server_name: String,

    /// Remote host name or address
    pub host: String,

    /// Remote TCP port (1-65535)
    pub port: i32,

    /// Database holding the invoice schema on the remote server
    pub database_name: String,

    /// SQL login name
    pub username: String,

    /// SQL login password, stored in clear text
    pub password: String,

    /// Whether the profile is expected to be reachable
    pub is_active: bool,

    /// Free-text description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Timestamp when the profile was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the profile was last updated
    pub updated_at: DateTimeWithTimeZone,

    /// Soft-delete marker; set rows are hidden from default listings
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Returns true when every field needed to open a connection is present.
    pub fn is_valid(&self) -> bool {
        !self.server_name.is_empty() && self.target().is_complete()
    }

    /// Returns true when the profile has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Network coordinates and credentials of the remote server.
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget {
            host: self.host.clone(),
            port: self.port,
            database: self.database_name.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
