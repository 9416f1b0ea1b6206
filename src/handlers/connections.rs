//! # Connections API Handlers
//!
//! Handlers for the connection profile registry and live connection tests.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::handlers::types::{ApiMessage, ApiResponse, PaginatedProfiles, ProfileInfo};
use crate::server::AppState;
use crate::services::{
    ConnectionTestResult, ProfileError, ProfileInput, ProfileStats, TestConnectionRequest,
};
use crate::validation;

/// Query parameters for the profile listing
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListConnectionsQuery {
    /// Only return active profiles (`true`, `1`, `si`, ...)
    pub active_only: Option<String>,
}

/// Query parameters for the paginated listing. Unparseable values fall back to defaults.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number (1-based, default 1)
    pub page: Option<String>,
    /// Page size (default 10, max 100)
    pub page_size: Option<String>,
}

/// Body of `PUT /connections/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateConnectionRequest {
    /// Must match the path id when present
    pub id: Option<i32>,
    #[serde(flatten)]
    pub profile: ProfileInput,
}

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::from(ProfileError::InvalidId))
}

fn test_status(result: &ConnectionTestResult) -> StatusCode {
    if result.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn test_envelope(result: ConnectionTestResult) -> (StatusCode, Json<ApiResponse<ConnectionTestResult>>) {
    let status = test_status(&result);
    let envelope = ApiResponse {
        success: result.success,
        message: result.message.clone(),
        data: Some(result),
    };
    (status, Json(envelope))
}

/// Creates a connection profile; active profiles must pass a live test first
#[utoipa::path(
    post,
    path = "/api/v1/connections",
    request_body = ProfileInput,
    responses(
        (status = 201, description = "Profile created", body = ApiResponse<ProfileInfo>),
        (status = 400, description = "Invalid data or failed connection test", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn create_connection(
    State(state): State<AppState>,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProfileInfo>>), ApiError> {
    let Json(input) = payload?;

    let profile = state
        .profile_service()
        .create(input)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error creando conexión"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Conexión creada exitosamente",
            ProfileInfo::from(profile),
        )),
    ))
}

/// Lists profiles that are not soft-deleted, ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/connections",
    params(ListConnectionsQuery),
    responses(
        (status = 200, description = "Profiles", body = ApiResponse<Vec<ProfileInfo>>)
    ),
    tag = "connections"
)]
pub async fn list_connections(
    State(state): State<AppState>,
    query: Result<Query<ListConnectionsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ProfileInfo>>>, ApiError> {
    let Query(query) = query?;
    let mut errors = Vec::new();
    let active_only = validation::optional_boolean(
        query.active_only.as_deref().unwrap_or_default(),
        "El parámetro active_only debe ser un valor booleano",
    )
    .collect_into(&mut errors);
    if !errors.is_empty() {
        return Err(ApiError::validation("Parámetros inválidos", errors));
    }

    let service = state.profile_service();
    let profiles = if active_only {
        service.list_active().await
    } else {
        service.list().await
    }
    .map_err(|e| ApiError::from(e).with_message("Error obteniendo conexiones"))?;

    Ok(Json(ApiResponse::ok(
        "Conexiones obtenidas exitosamente",
        profiles.into_iter().map(ProfileInfo::from).collect(),
    )))
}

/// Lists one page of profiles
#[utoipa::path(
    get,
    path = "/api/v1/connections/paginated",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of profiles", body = ApiResponse<PaginatedProfiles>)
    ),
    tag = "connections"
)]
pub async fn list_connections_paginated(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<PaginatedProfiles>>, ApiError> {
    let lenient = |raw: Option<String>, fallback: i64| {
        raw.and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(fallback)
    };
    let page = lenient(query.page, 1);
    let page_size = lenient(query.page_size, crate::services::profiles::DEFAULT_PAGE_SIZE as i64);

    let result = state
        .profile_service()
        .paginate(page, page_size)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error obteniendo conexiones"))?;

    Ok(Json(ApiResponse::ok(
        "Conexiones obtenidas exitosamente",
        PaginatedProfiles::from(result),
    )))
}

/// Counts profiles by state
#[utoipa::path(
    get,
    path = "/api/v1/connections/stats",
    responses(
        (status = 200, description = "Totals", body = ApiResponse<ProfileStats>)
    ),
    tag = "connections"
)]
pub async fn connection_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProfileStats>>, ApiError> {
    let stats = state
        .profile_service()
        .stats()
        .await
        .map_err(|e| ApiError::from(e).with_message("Error obteniendo estadísticas"))?;

    Ok(Json(ApiResponse::ok("Estadísticas obtenidas exitosamente", stats)))
}

/// Gets a profile by id, soft-deleted ones included
#[utoipa::path(
    get,
    path = "/api/v1/connections/{id}",
    params(("id" = i32, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile", body = ApiResponse<ProfileInfo>),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Not found", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn get_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProfileInfo>>, ApiError> {
    let id = parse_id(&id)?;
    let profile = state
        .profile_service()
        .get(id)
        .await
        .map_err(|e| ApiError::from(e).with_message("Conexión no encontrada"))?;

    Ok(Json(ApiResponse::ok(
        "Conexión obtenida exitosamente",
        ProfileInfo::from(profile),
    )))
}

/// Replaces a profile; active profiles must pass a live test first
#[utoipa::path(
    put,
    path = "/api/v1/connections/{id}",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = UpdateConnectionRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileInfo>),
        (status = 400, description = "Invalid data, id mismatch or failed connection test", body = ApiError),
        (status = 404, description = "Not found", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn update_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateConnectionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProfileInfo>>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;

    if let Some(body_id) = request.id
        && body_id != id
    {
        return Err(ApiError::validation(
            "Datos inválidos",
            vec!["El ID del cuerpo no coincide con el ID de la URL".to_string()],
        ));
    }

    let profile = state
        .profile_service()
        .update(id, request.profile)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error actualizando conexión"))?;

    Ok(Json(ApiResponse::ok(
        "Conexión actualizada exitosamente",
        ProfileInfo::from(profile),
    )))
}

/// Permanently removes a profile
#[utoipa::path(
    delete,
    path = "/api/v1/connections/{id}",
    params(("id" = i32, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile deleted", body = ApiMessage),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Not found", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn delete_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = parse_id(&id)?;
    state
        .profile_service()
        .delete(id)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error eliminando conexión"))?;

    Ok(Json(ApiMessage::ok("Conexión eliminada exitosamente")))
}

/// Marks a profile as deleted without removing it
#[utoipa::path(
    patch,
    path = "/api/v1/connections/{id}/soft-delete",
    params(("id" = i32, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile soft-deleted", body = ApiMessage),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Not found or already deleted", body = ApiError)
    ),
    tag = "connections"
)]
pub async fn soft_delete_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = parse_id(&id)?;
    state
        .profile_service()
        .soft_delete(id)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error eliminando conexión"))?;

    Ok(Json(ApiMessage::ok("Conexión desactivada exitosamente")))
}

/// Tests connectivity of a stored profile
#[utoipa::path(
    post,
    path = "/api/v1/connections/{id}/test",
    params(("id" = i32, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Server reachable", body = ApiResponse<ConnectionTestResult>),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Not found", body = ApiError),
        (status = 503, description = "Server unreachable", body = ApiResponse<ConnectionTestResult>)
    ),
    tag = "connections"
)]
pub async fn test_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<ConnectionTestResult>>), ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .profile_service()
        .test(id)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error probando conexión"))?;

    Ok(test_envelope(result))
}

/// Tests connectivity of unsaved profile attributes
#[utoipa::path(
    post,
    path = "/api/v1/connections/test",
    request_body = TestConnectionRequest,
    responses(
        (status = 200, description = "Server reachable", body = ApiResponse<ConnectionTestResult>),
        (status = 400, description = "Invalid data", body = ApiError),
        (status = 503, description = "Server unreachable", body = ApiResponse<ConnectionTestResult>)
    ),
    tag = "connections"
)]
pub async fn test_connection_params(
    State(state): State<AppState>,
    payload: Result<Json<TestConnectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ConnectionTestResult>>), ApiError> {
    let Json(request) = payload?;
    let result = state
        .profile_service()
        .test_input(request)
        .await
        .map_err(|e| ApiError::from(e).with_message("Error probando conexión"))?;

    Ok(test_envelope(result))
}
