//! Invoice lookups against the remote server selected by a connection profile.
//!
//! Every call resolves the profile, opens its own remote handle, verifies it
//! with a bounded ping (reopening once if the ping fails), runs one query and
//! closes the handle.

use chrono::{Datelike, NaiveDate};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use utoipa::ToSchema;

use crate::remote::{ConnectionString, RemoteDriver, RemoteError, RemoteHandle, RemoteRow, SqlParam};
use crate::repositories::ConnectionProfileRepository;

/// Errors surfaced by [`InvoiceQueryService`]
#[derive(Debug, Error)]
pub enum InvoiceQueryError {
    #[error("servidor con ID {0} no encontrado")]
    ProfileNotFound(i32),
    #[error("no se pudo conectar: {0}")]
    Connect(RemoteError),
    #[error("error al crear nueva conexión: {0}")]
    Reconnect(RemoteError),
    #[error("error al buscar facturas: {0}")]
    Query(RemoteError),
    #[error("no se encontraron facturas")]
    NoRecords,
    #[error("error de base de datos: {0}")]
    Database(#[from] DbErr),
}

/// Last year the remote `date` columns can store.
pub const MAX_REMOTE_YEAR: i32 = 9999;

/// Filters of one invoice lookup. Optional filters apply only when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceQuerySpec {
    pub profile_id: i32,
    pub date_from: NaiveDate,
    /// Inclusive: invoices issued at any time on this day match.
    pub date_to: NaiveDate,
    pub branch_id: Option<i64>,
    pub document_number: Option<String>,
    pub invoice_number: Option<i64>,
    pub product_code: Option<String>,
}

/// One invoice line as returned by the remote server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceRow {
    pub numero_factura: Option<String>,
    pub nombre_razon_social: Option<String>,
    pub numero_documento: Option<String>,
    pub codigo_producto_sfe: Option<String>,
    pub descripcion: Option<String>,
    pub sub_total: Option<String>,
    pub cuf: Option<String>,
    pub fecha_emision: Option<String>,
    pub fecha_envio: Option<String>,
    pub estado_documento_fiscal: Option<String>,
    pub usuario_emision: Option<String>,
    /// Branch name
    pub nombre: Option<String>,
    pub codigo_sucursal_sin: Option<String>,
    pub tipo_factura: Option<String>,
}

impl From<&RemoteRow> for InvoiceRow {
    fn from(row: &RemoteRow) -> Self {
        Self {
            numero_factura: row.text("numero_factura"),
            nombre_razon_social: row.text("nombre_razon_social"),
            numero_documento: row.text("numero_documento"),
            codigo_producto_sfe: row.text("codigo_producto_sfe"),
            descripcion: row.text("descripcion"),
            sub_total: row.text("sub_total"),
            cuf: row.text("cuf"),
            fecha_emision: row.text("fecha_emision"),
            fecha_envio: row.text("fecha_envio"),
            estado_documento_fiscal: row.text("estado_documento_fiscal"),
            usuario_emision: row.text("usuario_emision"),
            nombre: row.text("nombre"),
            codigo_sucursal_sin: row.text("codigo_sucursal_sin"),
            tipo_factura: row.text("tipo_factura"),
        }
    }
}

/// One branch (`sfe_sucursal`) of the remote issuer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BranchRow {
    pub id: Option<String>,
    pub nombre: Option<String>,
    pub codigo_sucursal_sin: Option<String>,
}

impl From<&RemoteRow> for BranchRow {
    fn from(row: &RemoteRow) -> Self {
        Self {
            id: row.text("id"),
            nombre: row.text("nombre"),
            codigo_sucursal_sin: row.text("codigo_sucursal_sin"),
        }
    }
}

const INVOICE_SELECT: &str = "SELECT \
     CONVERT(NVARCHAR(50), df.numero_factura) AS numero_factura, \
     CONVERT(NVARCHAR(500), df.nombre_razon_social) AS nombre_razon_social, \
     CONVERT(NVARCHAR(100), df.numero_documento) AS numero_documento, \
     CONVERT(NVARCHAR(100), dff.codigo_producto_sfe) AS codigo_producto_sfe, \
     CONVERT(NVARCHAR(2000), dff.descripcion) AS descripcion, \
     CONVERT(NVARCHAR(50), dff.sub_total) AS sub_total, \
     CONVERT(NVARCHAR(200), df.cuf) AS cuf, \
     CONVERT(NVARCHAR(33), df.fecha_emision, 126) AS fecha_emision, \
     CONVERT(NVARCHAR(33), df.fecha_envio, 126) AS fecha_envio, \
     CONVERT(NVARCHAR(100), df.estado_documento_fiscal) AS estado_documento_fiscal, \
     CONVERT(NVARCHAR(100), df.usuario_emision) AS usuario_emision, \
     CONVERT(NVARCHAR(200), su.nombre) AS nombre, \
     CONVERT(NVARCHAR(50), su.codigo_sucursal_sin) AS codigo_sucursal_sin, \
     CONVERT(NVARCHAR(50), df.tipo_factura) AS tipo_factura \
     FROM dbo.sfe_documento_fiscal AS df \
     JOIN dbo.sfe_detalle_documento_fiscal AS dff ON df.id = dff.id_sfe_documento_fiscal \
     JOIN dbo.sfe_sucursal AS su ON df.id_sfe_sucursal = su.id";

const BRANCH_SQL: &str = "SELECT \
     CONVERT(NVARCHAR(20), su.id) AS id, \
     CONVERT(NVARCHAR(200), su.nombre) AS nombre, \
     CONVERT(NVARCHAR(50), su.codigo_sucursal_sin) AS codigo_sucursal_sin \
     FROM dbo.sfe_sucursal AS su \
     ORDER BY su.id";

/// Builds the parameterized invoice listing for `spec`.
pub fn build_invoice_query(spec: &InvoiceQuerySpec) -> (String, Vec<SqlParam>) {
    let mut sql = String::from(INVOICE_SELECT);
    let mut params = vec![SqlParam::Date(spec.date_from)];
    sql.push_str(" WHERE df.fecha_emision >= @P1");

    // Nothing is stored after the last remote day, so it needs no upper bound.
    let day_after = spec
        .date_to
        .succ_opt()
        .filter(|next| next.year() <= MAX_REMOTE_YEAR);
    if let Some(day_after) = day_after {
        params.push(SqlParam::Date(day_after));
        sql.push_str(" AND df.fecha_emision < @P2");
    }

    let mut push = |column: &str, param: SqlParam| {
        params.push(param);
        sql.push_str(&format!(" AND {} = @P{}", column, params.len()));
    };

    if let Some(branch_id) = spec.branch_id {
        push("su.id", SqlParam::Int(branch_id));
    }
    if let Some(document_number) = &spec.document_number {
        push("df.numero_documento", SqlParam::Text(document_number.clone()));
    }
    if let Some(invoice_number) = spec.invoice_number {
        push("df.numero_factura", SqlParam::Int(invoice_number));
    }
    if let Some(product_code) = &spec.product_code {
        push("dff.codigo_producto_sfe", SqlParam::Text(product_code.clone()));
    }

    sql.push_str(" ORDER BY df.fecha_emision, df.numero_factura");
    (sql, params)
}

#[derive(Clone)]
pub struct InvoiceQueryService {
    profiles: ConnectionProfileRepository,
    driver: Arc<dyn RemoteDriver>,
    probe_timeout: Duration,
}

impl InvoiceQueryService {
    pub fn new(
        profiles: ConnectionProfileRepository,
        driver: Arc<dyn RemoteDriver>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            profiles,
            driver,
            probe_timeout,
        }
    }

    /// Lists invoice lines matching `spec`. An empty result is an error.
    pub async fn invoices(&self, spec: &InvoiceQuerySpec) -> Result<Vec<InvoiceRow>, InvoiceQueryError> {
        let (sql, params) = build_invoice_query(spec);
        let started = Instant::now();
        let rows = self.run(spec.profile_id, &sql, &params).await?;

        tracing::info!(
            profile_id = spec.profile_id,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Invoice query finished"
        );

        if rows.is_empty() {
            return Err(InvoiceQueryError::NoRecords);
        }
        Ok(rows.iter().map(InvoiceRow::from).collect())
    }

    /// Lists every branch of the remote issuer.
    pub async fn branches(&self, profile_id: i32) -> Result<Vec<BranchRow>, InvoiceQueryError> {
        let rows = self.run(profile_id, BRANCH_SQL, &[]).await?;
        Ok(rows.iter().map(BranchRow::from).collect())
    }

    async fn run(
        &self,
        profile_id: i32,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<RemoteRow>, InvoiceQueryError> {
        let mut handle = self.connect(profile_id).await?;
        let result = handle.query(sql, params).await;
        handle.close().await;

        result.map_err(|e| {
            tracing::warn!(profile_id, error = %e, "Remote query failed");
            InvoiceQueryError::Query(e)
        })
    }

    async fn connect(&self, profile_id: i32) -> Result<Box<dyn RemoteHandle>, InvoiceQueryError> {
        let profile = self
            .profiles
            .find_live_by_id(profile_id)
            .await?
            .ok_or(InvoiceQueryError::ProfileNotFound(profile_id))?;
        if !profile.is_valid() {
            return Err(InvoiceQueryError::Connect(RemoteError::InvalidConnectionString(
                "el perfil de conexión está incompleto".to_string(),
            )));
        }

        let dsn = ConnectionString::url(&profile.target()).map_err(InvoiceQueryError::Connect)?;
        let mut handle = self.driver.open(&dsn).map_err(InvoiceQueryError::Connect)?;

        let Err(first) = self.ping(handle.as_mut()).await else {
            return Ok(handle);
        };
        tracing::warn!(profile_id, error = %first, "Remote ping failed, reconnecting once");
        handle.close().await;

        let mut fresh = self.driver.open(&dsn).map_err(InvoiceQueryError::Reconnect)?;
        match self.ping(fresh.as_mut()).await {
            Ok(()) => Ok(fresh),
            Err(e) => {
                fresh.close().await;
                Err(InvoiceQueryError::Reconnect(e))
            }
        }
    }

    async fn ping(&self, handle: &mut dyn RemoteHandle) -> Result<(), RemoteError> {
        tokio::time::timeout(self.probe_timeout, handle.ping())
            .await
            .unwrap_or(Err(RemoteError::Timeout(self.probe_timeout)))
    }
}
