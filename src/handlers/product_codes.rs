//! Product code catalog handlers.

use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::error::ApiError;
use crate::handlers::types::ApiResponse;
use crate::server::AppState;
use crate::services::ProductCodeInfo;
use crate::validation;

/// Lists product codes that are not deleted, ordered by code
#[utoipa::path(
    get,
    path = "/api/v1/codigoproducto",
    responses(
        (status = 200, description = "Product codes", body = ApiResponse<Vec<ProductCodeInfo>>)
    ),
    tag = "codigoproducto"
)]
pub async fn list_product_codes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductCodeInfo>>>, ApiError> {
    let codes = state
        .product_code_service()
        .list()
        .await
        .map_err(|e| ApiError::from(e).with_message("Error obteniendo códigos de producto"))?;

    Ok(Json(ApiResponse::ok("Códigos de producto", codes)))
}

/// Looks up one product code
#[utoipa::path(
    get,
    path = "/api/v1/codigoproducto/{codigo}",
    params(("codigo" = String, Path, description = "Product code")),
    responses(
        (status = 200, description = "Product code", body = ApiResponse<ProductCodeInfo>),
        (status = 400, description = "Blank code", body = ApiError),
        (status = 404, description = "Unknown code", body = ApiError)
    ),
    tag = "codigoproducto"
)]
pub async fn get_product_code(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> Result<Json<ApiResponse<ProductCodeInfo>>, ApiError> {
    let checked = validation::required_text(&codigo, "El código de producto es requerido");
    if !checked.is_ok() {
        return Err(ApiError::validation("Datos inválidos", checked.errors));
    }
    let codigo = checked.value;

    let code = state
        .product_code_service()
        .get(&codigo)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error obteniendo código de producto"))?
        .ok_or_else(|| {
            ApiError::not_found(format!("código de producto '{}' no encontrado", codigo))
        })?;

    Ok(Json(ApiResponse::ok("Código de producto", code)))
}
