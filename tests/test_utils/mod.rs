//! Test utilities shared by the integration tests.
//!
//! Provides an in-memory SQLite store with migrations applied, a scripted
//! [`RemoteDriver`] standing in for SQL Server, and helpers to drive the
//! router with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use invoice_gateway::{
    config::AppConfig,
    remote::{
        ConnectionString, RemoteDriver, RemoteError, RemoteHandle, RemoteRow, ServerInfo, SqlParam,
    },
    repositories::{ConnectionProfileRepository, ProfileFields},
    server::{AppState, create_app},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up an in-memory SQLite database with all migrations applied and returns an Arc.
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(db))
}

/// Scripted behavior and call log of the fake remote server.
#[derive(Debug, Default)]
pub struct FakeRemote {
    /// Reject every connection string at open time
    pub reject_dsn: bool,
    /// Number of pings that fail before pings start succeeding
    pub failing_pings: AtomicUsize,
    /// Make the server-info diagnostic fail
    pub info_fails: bool,
    /// Rows returned by every query
    pub rows: Vec<RemoteRow>,
    /// Error returned by every query instead of `rows`
    pub query_error: Option<RemoteError>,

    pub opens: AtomicUsize,
    pub pings: AtomicUsize,
    pub closes: AtomicUsize,
    pub queries: Mutex<Vec<(String, Vec<SqlParam>)>>,
    pub dsns: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            failing_pings: AtomicUsize::new(usize::MAX),
            ..Self::default()
        }
    }

    pub fn with_rows(rows: Vec<RemoteRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn flaky(failing_pings: usize) -> Self {
        Self {
            failing_pings: AtomicUsize::new(failing_pings),
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(String, Vec<SqlParam>)> {
        self.queries.lock().unwrap().last().cloned()
    }
}

/// [`RemoteDriver`] backed by a [`FakeRemote`] script.
#[derive(Debug, Clone)]
pub struct FakeDriver(pub Arc<FakeRemote>);

impl RemoteDriver for FakeDriver {
    fn open(&self, dsn: &ConnectionString) -> Result<Box<dyn RemoteHandle>, RemoteError> {
        self.0.dsns.lock().unwrap().push(dsn.as_str().to_string());
        if self.0.reject_dsn {
            return Err(RemoteError::InvalidConnectionString(
                "unexpected token".to_string(),
            ));
        }
        self.0.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeHandle(self.0.clone())))
    }
}

struct FakeHandle(Arc<FakeRemote>);

#[async_trait]
impl RemoteHandle for FakeHandle {
    async fn ping(&mut self) -> Result<(), RemoteError> {
        self.0.pings.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .0
            .failing_pings
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                if left == 0 {
                    None
                } else if left == usize::MAX {
                    Some(left)
                } else {
                    Some(left - 1)
                }
            })
            .is_ok();

        if failed {
            Err(RemoteError::Connect("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn server_info(&mut self) -> Result<ServerInfo, RemoteError> {
        if self.0.info_fails {
            return Err(RemoteError::Query("permission denied".to_string()));
        }
        Ok(ServerInfo {
            version: "Microsoft SQL Server 2019 (RTM) - 15.0.2000.5".to_string(),
            product_name: "Microsoft SQL Server".to_string(),
            edition: "Developer Edition (64-bit)".to_string(),
        })
    }

    async fn query(
        &mut self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<RemoteRow>, RemoteError> {
        self.0
            .queries
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        match &self.0.query_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.0.rows.clone()),
        }
    }

    async fn close(self: Box<Self>) {
        self.0.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builds application state over `db` and the scripted remote.
pub fn app_state(db: DatabaseConnection, remote: Arc<FakeRemote>) -> AppState {
    AppState::new(Arc::new(AppConfig::default()), db, Arc::new(FakeDriver(remote)))
}

/// Fresh store plus router over the scripted remote.
pub async fn setup_test_app(remote: Arc<FakeRemote>) -> (Router, DatabaseConnection) {
    let db = setup_test_db().await.unwrap();
    let app = create_app(app_state(db.clone(), remote));
    (app, db)
}

/// Sends one request through the router and decodes the JSON body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Request body for a valid profile.
pub fn profile_body(server_name: &str, is_active: bool) -> Value {
    serde_json::json!({
        "server_name": server_name,
        "host": "10.0.0.5",
        "port": 1433,
        "database_name": "FacturasDB",
        "username": "reporter",
        "password": "s3cret",
        "is_active": is_active,
        "description": "Servidor de pruebas"
    })
}

/// Inserts a profile directly, bypassing the live connection test.
pub async fn insert_profile(db: &DatabaseConnection, server_name: &str, is_active: bool) -> i32 {
    ConnectionProfileRepository::new(Arc::new(db.clone()))
        .create(ProfileFields {
            server_name: server_name.to_string(),
            host: "10.0.0.5".to_string(),
            port: 1433,
            database_name: "FacturasDB".to_string(),
            username: "reporter".to_string(),
            password: "s3cret".to_string(),
            is_active,
            description: None,
        })
        .await
        .unwrap()
        .id
}

/// One invoice line as the remote server would return it.
pub fn invoice_row(numero_factura: &str) -> RemoteRow {
    RemoteRow::new(vec![
        ("numero_factura".to_string(), Some(numero_factura.to_string())),
        ("nombre_razon_social".to_string(), Some("Comercial Andina SRL".to_string())),
        ("numero_documento".to_string(), Some("1020304".to_string())),
        ("codigo_producto_sfe".to_string(), Some("99100".to_string())),
        ("descripcion".to_string(), Some("Servicio de soporte".to_string())),
        ("sub_total".to_string(), Some("150.00".to_string())),
        ("cuf".to_string(), None),
        ("fecha_emision".to_string(), Some("2024-01-15T10:30:00".to_string())),
        ("nombre".to_string(), Some("Casa Matriz".to_string())),
        ("codigo_sucursal_sin".to_string(), Some("0".to_string())),
    ])
}
