//! Connection profile management.
//!
//! Wraps [`ConnectionProfileRepository`] with request validation, the live
//! connection test required before persisting an active profile, and
//! pagination.

use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::connection_profile::{self, DEFAULT_PORT};
use crate::remote::ConnectionTarget;
use crate::repositories::{ConnectionProfileRepository, ProfileFields, StoreError};
use crate::services::connection_test::{ConnectionTestResult, ConnectionTester};
use crate::validation::validate_host;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Errors surfaced by [`ProfileService`]
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("ID de conexión inválido")]
    InvalidId,
    #[error("datos de conexión inválidos")]
    Validation(Vec<String>),
    #[error("ya existe una conexión con el nombre '{0}'")]
    DuplicateName(String),
    #[error("conexión con ID {0} no encontrada")]
    NotFound(i32),
    #[error("no se pudo conectar a la base de datos: {}", failure_reason(.0))]
    ConnectionTestFailed(Box<ConnectionTestResult>),
    #[error("error de base de datos: {0}")]
    Database(#[from] DbErr),
}

impl From<StoreError> for ProfileError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateName(name) => ProfileError::DuplicateName(name),
            StoreError::NotFound(id) => ProfileError::NotFound(id),
            StoreError::Database(e) => ProfileError::Database(e),
        }
    }
}

fn failure_reason(result: &ConnectionTestResult) -> &str {
    result.error.as_deref().unwrap_or(&result.message)
}

fn default_port() -> i32 {
    DEFAULT_PORT
}

fn default_active() -> bool {
    true
}

/// Profile attributes supplied by clients on create, update and ad-hoc tests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ProfileInput {
    #[validate(length(
        min = 3,
        max = 100,
        message = "server_name debe tener entre 3 y 100 caracteres"
    ))]
    pub server_name: String,
    #[validate(
        length(min = 1, max = 255, message = "host es requerido (máximo 255 caracteres)"),
        custom(function = "validate_host")
    )]
    pub host: String,
    #[serde(default = "default_port")]
    #[validate(range(min = 1, max = 65535, message = "port debe estar entre 1 y 65535"))]
    pub port: i32,
    #[validate(length(
        min = 1,
        max = 100,
        message = "database_name es requerido (máximo 100 caracteres)"
    ))]
    pub database_name: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "username es requerido (máximo 100 caracteres)"
    ))]
    pub username: String,
    #[validate(length(min = 1, message = "password es requerido"))]
    pub password: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProfileInput {
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget {
            host: self.host.trim().to_string(),
            port: self.port,
            database: self.database_name.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }

    /// Validates and normalizes into store fields.
    fn into_fields(self) -> Result<ProfileFields, ProfileError> {
        let input = ProfileInput {
            server_name: self.server_name.trim().to_string(),
            host: self.host.trim().to_string(),
            database_name: self.database_name.trim().to_string(),
            username: self.username.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..self
        };
        input.validate().map_err(|e| ProfileError::Validation(flatten_errors(&e)))?;

        Ok(ProfileFields {
            server_name: input.server_name,
            host: input.host,
            port: input.port,
            database_name: input.database_name,
            username: input.username,
            password: input.password,
            is_active: input.is_active,
            description: input.description,
        })
    }
}

/// Connection coordinates for an ad-hoc test of an unsaved profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct TestConnectionRequest {
    #[validate(
        length(min = 1, max = 255, message = "host es requerido (máximo 255 caracteres)"),
        custom(function = "validate_host")
    )]
    pub host: String,
    #[serde(default = "default_port")]
    #[validate(range(min = 1, max = 65535, message = "port debe estar entre 1 y 65535"))]
    pub port: i32,
    #[validate(length(
        min = 1,
        max = 100,
        message = "database_name es requerido (máximo 100 caracteres)"
    ))]
    pub database_name: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "username es requerido (máximo 100 caracteres)"
    ))]
    pub username: String,
    #[validate(length(min = 1, message = "password es requerido"))]
    pub password: String,
}

impl TestConnectionRequest {
    /// Validates and trims into a connection target.
    fn into_target(self) -> Result<ConnectionTarget, ProfileError> {
        let request = TestConnectionRequest {
            host: self.host.trim().to_string(),
            database_name: self.database_name.trim().to_string(),
            username: self.username.trim().to_string(),
            ..self
        };
        request
            .validate()
            .map_err(|e| ProfileError::Validation(flatten_errors(&e)))?;

        Ok(ConnectionTarget {
            host: request.host,
            port: request.port,
            database: request.database_name,
            username: request.username,
            password: request.password,
        })
    }
}

/// Flattens `validator` output into sorted `field: message` lines.
pub fn flatten_errors(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    lines.sort();
    lines
}

/// Page/page-size pair after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Page below 1 becomes 1; page size below 1 becomes the default and
    /// above the maximum becomes the maximum.
    pub fn clamped(page: i64, page_size: i64) -> Self {
        let page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let page_size = match u64::try_from(page_size) {
            Ok(0) | Err(_) => DEFAULT_PAGE_SIZE,
            Ok(size) => size.min(MAX_PAGE_SIZE),
        };
        Self { page, page_size }
    }

    /// Row offset of the page, capped at what the SQL binders accept.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }
}

/// One page of profiles
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub data: Vec<connection_profile::Model>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Profile totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProfileStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

pub struct ProfileService {
    repo: ConnectionProfileRepository,
    tester: ConnectionTester,
}

impl ProfileService {
    pub fn new(repo: ConnectionProfileRepository, tester: ConnectionTester) -> Self {
        Self { repo, tester }
    }

    /// Validates and stores a new profile. Active profiles must pass a live test first.
    pub async fn create(&self, input: ProfileInput) -> Result<connection_profile::Model, ProfileError> {
        let target = input.target();
        let fields = input.into_fields()?;

        if fields.is_active {
            self.require_reachable(&fields.server_name, &target).await?;
        }

        let profile = self.repo.create(fields).await?;
        tracing::info!(profile_id = profile.id, server_name = %profile.server_name, "Connection profile created");
        Ok(profile)
    }

    pub async fn get(&self, id: i32) -> Result<connection_profile::Model, ProfileError> {
        ensure_id(id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ProfileError::NotFound(id))
    }

    pub async fn get_by_server_name(
        &self,
        server_name: &str,
    ) -> Result<Option<connection_profile::Model>, ProfileError> {
        Ok(self.repo.find_by_server_name(server_name.trim()).await?)
    }

    pub async fn list(&self) -> Result<Vec<connection_profile::Model>, ProfileError> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn list_active(&self) -> Result<Vec<connection_profile::Model>, ProfileError> {
        Ok(self.repo.list_active().await?)
    }

    /// Replaces the profile's attributes. Active profiles must pass a live test first.
    pub async fn update(
        &self,
        id: i32,
        input: ProfileInput,
    ) -> Result<connection_profile::Model, ProfileError> {
        ensure_id(id)?;
        let target = input.target();
        let fields = input.into_fields()?;

        if self.repo.find_by_id(id).await?.is_none() {
            return Err(ProfileError::NotFound(id));
        }

        if fields.is_active {
            self.require_reachable(&fields.server_name, &target).await?;
        }

        let profile = self.repo.update(id, fields).await?;
        tracing::info!(profile_id = id, server_name = %profile.server_name, "Connection profile updated");
        Ok(profile)
    }

    pub async fn delete(&self, id: i32) -> Result<(), ProfileError> {
        ensure_id(id)?;
        self.repo.hard_delete(id).await?;
        tracing::info!(profile_id = id, "Connection profile deleted");
        Ok(())
    }

    pub async fn soft_delete(&self, id: i32) -> Result<(), ProfileError> {
        ensure_id(id)?;
        self.repo.soft_delete(id).await?;
        tracing::info!(profile_id = id, "Connection profile soft-deleted");
        Ok(())
    }

    /// Runs a connection test against a stored profile.
    pub async fn test(&self, id: i32) -> Result<ConnectionTestResult, ProfileError> {
        let profile = self.get(id).await?;
        Ok(self.tester.test(&profile.target()).await)
    }

    /// Runs a connection test against unsaved connection coordinates.
    pub async fn test_input(
        &self,
        request: TestConnectionRequest,
    ) -> Result<ConnectionTestResult, ProfileError> {
        let target = request.into_target()?;
        Ok(self.tester.test(&target).await)
    }

    pub async fn paginate(&self, page: i64, page_size: i64) -> Result<ProfilePage, ProfileError> {
        let request = PageRequest::clamped(page, page_size);
        let (data, total) = self
            .repo
            .list_page(request.offset(), request.page_size)
            .await?;

        Ok(ProfilePage {
            data,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: total.div_ceil(request.page_size),
        })
    }

    pub async fn count(&self) -> Result<u64, ProfileError> {
        Ok(self.repo.count().await?)
    }

    pub async fn stats(&self) -> Result<ProfileStats, ProfileError> {
        let total = self.repo.count().await?;
        let active = self.repo.count_active().await?;
        Ok(ProfileStats {
            total,
            active,
            inactive: total.saturating_sub(active),
        })
    }

    async fn require_reachable(
        &self,
        server_name: &str,
        target: &ConnectionTarget,
    ) -> Result<(), ProfileError> {
        let result = self.tester.test(target).await;
        if result.success {
            Ok(())
        } else {
            tracing::warn!(server_name = %server_name, error = ?result.error, "Rejected profile that failed its connection test");
            Err(ProfileError::ConnectionTestFailed(Box::new(result)))
        }
    }
}

fn ensure_id(id: i32) -> Result<(), ProfileError> {
    if id <= 0 {
        Err(ProfileError::InvalidId)
    } else {
        Ok(())
    }
}
