//! # API Handlers
//!
//! HTTP endpoint handlers for the invoice gateway.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod connections;
pub mod invoices;
pub mod product_codes;
pub mod types;

/// Liveness report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// `ok` or `degraded`
    pub status: String,
    /// `up` or `down`
    pub database: String,
    pub version: String,
}

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Reports liveness together with the state of the local database
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthStatus),
        (status = 503, description = "Local database unreachable", body = HealthStatus)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ok".to_string(),
                database: "up".to_string(),
                version,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check found the local database down");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "degraded".to_string(),
                    database: "down".to_string(),
                    version,
                }),
            )
        }
    }
}
