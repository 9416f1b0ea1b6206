//! # Error Handling
//!
//! Unified error envelope for the HTTP API. Every failure renders as
//! `{success: false, code, message, error?, errors?, trace_id?}` with the
//! matching HTTP status.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::{InvoiceQueryError, ProfileError};
use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Always false
    pub success: bool,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable summary
    pub message: Box<str>,
    /// Underlying error text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Box<str>>,
    /// Itemized validation problems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Correlation trace ID for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            code: code.into(),
            message: message.into().into_boxed_str(),
            error: None,
            errors: None,
            trace_id: telemetry::current_trace_id().map(String::into_boxed_str),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into().into_boxed_str());
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Replaces the summary, keeping the underlying error text.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into().into_boxed_str();
        self
    }

    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        ErrorType::Validation.build(message).with_errors(errors)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ErrorType::NotFound.build(message)
    }
}

/// Standard error categories with predefined status codes
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ErrorType {
    #[error("Datos inválidos")]
    Validation,
    #[error("Recurso no encontrado")]
    NotFound,
    #[error("Conflicto")]
    Conflict,
    #[error("Error interno del servidor")]
    Internal,
    #[error("Servicio no disponible")]
    Unavailable,
}

impl ErrorType {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorType::Validation => StatusCode::BAD_REQUEST,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::Conflict => StatusCode::CONFLICT,
            ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorType::Validation => "VALIDATION_FAILED",
            ErrorType::NotFound => "NOT_FOUND",
            ErrorType::Conflict => "CONFLICT",
            ErrorType::Internal => "INTERNAL_SERVER_ERROR",
            ErrorType::Unavailable => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn build(self, message: impl Into<String>) -> ApiError {
        ApiError::new(self.status_code(), self.error_code(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self)).into_response()
    }
}

impl From<ErrorType> for ApiError {
    fn from(error_type: ErrorType) -> Self {
        error_type.build(error_type.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", error);
        ErrorType::Internal.build("Error interno del servidor").with_error(error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = match &rejection {
            JsonRejection::JsonDataError(err) => format!("JSON inválido: {}", err.body_text()),
            JsonRejection::JsonSyntaxError(err) => {
                format!("Error de sintaxis JSON: {}", err.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => {
                "Falta el encabezado 'Content-Type: application/json'".to_string()
            }
            _ => rejection.body_text(),
        };

        ApiError::validation("Datos inválidos", vec![detail.clone()]).with_error(detail)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let detail = rejection.body_text();
        ApiError::validation("Parámetros inválidos", vec![detail.clone()]).with_error(detail)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::validation(
            "Datos inválidos",
            crate::services::profiles::flatten_errors(&errors),
        )
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        match error {
            sea_orm::DbErr::RecordNotFound(record) => {
                ErrorType::NotFound.build("Registro no encontrado").with_error(record)
            }
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                ErrorType::Unavailable.build("Base de datos no disponible")
            }
            other => {
                tracing::error!("Database error: {:?}", other);
                ErrorType::Internal
                    .build("Error de base de datos")
                    .with_error(other.to_string())
            }
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(error: ProfileError) -> Self {
        let detail = error.to_string();
        match error {
            ProfileError::InvalidId => ErrorType::Validation.build(detail),
            ProfileError::Validation(errors) => ApiError::validation("Datos inválidos", errors),
            ProfileError::DuplicateName(_) => ErrorType::Conflict.build(detail.clone()).with_error(detail),
            ProfileError::NotFound(_) => ErrorType::NotFound.build(detail.clone()).with_error(detail),
            ProfileError::ConnectionTestFailed(_) => {
                ErrorType::Validation.build(detail.clone()).with_error(detail)
            }
            ProfileError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<InvoiceQueryError> for ApiError {
    fn from(error: InvoiceQueryError) -> Self {
        let detail = error.to_string();
        match error {
            InvoiceQueryError::ProfileNotFound(_) | InvoiceQueryError::NoRecords => {
                ErrorType::NotFound.build(detail.clone()).with_error(detail)
            }
            InvoiceQueryError::Database(e) => ApiError::from(e),
            InvoiceQueryError::Connect(_)
            | InvoiceQueryError::Reconnect(_)
            | InvoiceQueryError::Query(_) => {
                tracing::error!(error = %detail, "Remote invoice query failed");
                ErrorType::Internal.build(detail.clone()).with_error(detail)
            }
        }
    }
}
