//! # Remote SQL Server access
//!
//! Everything that talks to a remote invoice server goes through the
//! [`RemoteDriver`] / [`RemoteHandle`] pair defined here. A driver turns a
//! connection string into an unconnected handle; the handle connects lazily
//! on its first round trip and must be closed by the caller.
//!
//! The production driver is [`sqlserver::SqlServerDriver`] (tiberius). Tests
//! substitute scripted drivers.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

pub mod dsn;
pub mod sqlserver;

pub use dsn::ConnectionString;
pub use sqlserver::SqlServerDriver;

/// Network coordinates and credentials of one remote server.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: i32,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionTarget {
    /// Returns true when no field required to log in is empty.
    pub fn is_complete(&self) -> bool {
        !self.host.is_empty()
            && self.port > 0
            && !self.database.is_empty()
            && !self.username.is_empty()
            && !self.password.is_empty()
    }
}

impl std::fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Failures raised while reaching or querying a remote server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
    #[error("{0}")]
    Connect(String),
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Query(String),
}

/// Identification of the remote server, as reported by the server itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServerInfo {
    pub version: String,
    pub product_name: String,
    pub edition: String,
}

/// Positional parameter bound to `@P1`, `@P2`, ... in a remote query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Date(NaiveDate),
}

/// One result row with every column rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteRow {
    columns: Vec<(String, Option<String>)>,
}

impl RemoteRow {
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Self { columns }
    }

    /// Value of `column`, `None` when the column is absent or SQL NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .and_then(|(_, value)| value.as_deref())
    }

    /// Owned copy of [`RemoteRow::get`].
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_owned)
    }
}

/// Factory for remote handles.
pub trait RemoteDriver: Send + Sync {
    /// Parses `dsn` and returns a handle that has not touched the network yet.
    fn open(&self, dsn: &ConnectionString) -> Result<Box<dyn RemoteHandle>, RemoteError>;
}

/// A single remote connection, established on first use.
#[async_trait]
pub trait RemoteHandle: Send {
    /// Establishes the connection if needed and runs a trivial round trip.
    async fn ping(&mut self) -> Result<(), RemoteError>;

    /// Reads version, product name and edition of the server.
    async fn server_info(&mut self) -> Result<ServerInfo, RemoteError>;

    /// Runs a parameterized query and returns its first result set.
    async fn query(
        &mut self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<RemoteRow>, RemoteError>;

    /// Releases the underlying connection.
    async fn close(self: Box<Self>);
}
