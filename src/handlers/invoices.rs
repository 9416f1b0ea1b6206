//! # Invoice Query Handlers
//!
//! `POST /consultar` and `GET /consultar/sucursales`.

use axum::{
    extract::{Query, State, rejection::JsonRejection},
    response::Json,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::handlers::types::{ApiResponse, lenient_string};
use crate::server::AppState;
use crate::services::{BranchRow, InvoiceQuerySpec, InvoiceRow, MAX_REMOTE_YEAR};
use crate::validation;

/// Body of `POST /consultar`. Values may be sent as strings or numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQueryRequest {
    /// Connection profile id
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "1")]
    pub id_server: String,
    /// First issue date, `YYYY-MM-DD`
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "2024-01-01")]
    pub fecha_desde: String,
    /// Last issue date (inclusive), `YYYY-MM-DD`
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "2024-01-31")]
    pub fecha_hasta: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub numero_documento: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub numero_factura: String,
    /// Branch id
    #[serde(default, deserialize_with = "lenient_string")]
    pub sucursal: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub codigo_producto: String,
}

impl InvoiceQueryRequest {
    /// Runs the field validators and merges their errors.
    pub fn into_spec(self) -> Result<InvoiceQuerySpec, Vec<String>> {
        let mut errors = Vec::new();

        let profile_id = validation::integer_in_range(
            &self.id_server,
            "El campo idServer es requerido",
            1,
            i64::from(i32::MAX),
        )
        .collect_into(&mut errors);
        let date_from = validation::date(&self.fecha_desde, "El campo fechaDesde es requerido")
            .collect_into(&mut errors);
        let date_to = validation::date(&self.fecha_hasta, "El campo fechaHasta es requerido")
            .collect_into(&mut errors);
        let branch_id = validation::optional_integer(&self.sucursal, "El campo sucursal debe ser numérico")
            .collect_into(&mut errors);
        let invoice_number =
            validation::optional_integer(&self.numero_factura, "El campo numeroFactura debe ser numérico")
                .collect_into(&mut errors);
        let document_number = validation::optional_text(&self.numero_documento).collect_into(&mut errors);
        let product_code = validation::optional_text(&self.codigo_producto).collect_into(&mut errors);

        for (field, day) in [("fechaDesde", date_from), ("fechaHasta", date_to)] {
            if let Some(day) = day
                && !(1..=MAX_REMOTE_YEAR).contains(&day.year())
            {
                errors.push(format!(
                    "El campo {} está fuera de rango (0001-01-01 a {}-12-31)",
                    field, MAX_REMOTE_YEAR
                ));
            }
        }

        if let (Some(from), Some(to)) = (date_from, date_to)
            && from > to
        {
            errors.push("El campo fechaDesde no puede ser posterior a fechaHasta".to_string());
        }

        match (date_from, date_to) {
            (Some(date_from), Some(date_to)) if errors.is_empty() => Ok(InvoiceQuerySpec {
                profile_id: profile_id as i32,
                date_from,
                date_to,
                branch_id,
                document_number: non_empty(document_number),
                invoice_number,
                product_code: non_empty(product_code),
            }),
            _ => Err(errors),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Query parameters of the branch listing
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BranchQuery {
    /// Connection profile id
    #[serde(rename = "idServer")]
    pub id_server: Option<String>,
}

/// Lists invoice lines of the selected remote server
#[utoipa::path(
    post,
    path = "/api/v1/consultar",
    request_body = InvoiceQueryRequest,
    responses(
        (status = 200, description = "Invoice lines", body = ApiResponse<Vec<InvoiceRow>>),
        (status = 400, description = "Invalid filters", body = ApiError),
        (status = 404, description = "Unknown server or no invoices", body = ApiError),
        (status = 500, description = "Remote query failed", body = ApiError)
    ),
    tag = "consultas"
)]
pub async fn query_invoices(
    State(state): State<AppState>,
    payload: Result<Json<InvoiceQueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<InvoiceRow>>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::from(e).with_message("Datos inválidos"))?;
    let spec = request
        .into_spec()
        .map_err(|errors| ApiError::validation("Datos inválidos", errors))?;

    let rows = state
        .invoice_service()
        .invoices(&spec)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error de consulta"))?;

    Ok(Json(ApiResponse::ok("Información de facturas", rows)))
}

/// Lists the branches of the selected remote server
#[utoipa::path(
    get,
    path = "/api/v1/consultar/sucursales",
    params(BranchQuery),
    responses(
        (status = 200, description = "Branches", body = ApiResponse<Vec<BranchRow>>),
        (status = 400, description = "Invalid idServer", body = ApiError),
        (status = 404, description = "Unknown server", body = ApiError),
        (status = 500, description = "Remote query failed", body = ApiError)
    ),
    tag = "consultas"
)]
pub async fn list_branches(
    State(state): State<AppState>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<ApiResponse<Vec<BranchRow>>>, ApiError> {
    let mut errors = Vec::new();
    let profile_id = validation::integer_in_range(
        query.id_server.as_deref().unwrap_or_default(),
        "El campo idServer es requerido",
        1,
        i64::from(i32::MAX),
    )
    .collect_into(&mut errors);
    if !errors.is_empty() {
        return Err(ApiError::validation("Datos inválidos", errors));
    }

    let branches = state
        .invoice_service()
        .branches(profile_id as i32)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error de consulta"))?;

    Ok(Json(ApiResponse::ok("Sucursales registradas", branches)))
}
