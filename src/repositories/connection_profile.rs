//! Connection profile repository
//!
//! SeaORM operations for the db_connections table. Rows carrying a
//! `deleted_at` marker are excluded from every listing and from the name
//! uniqueness check, but remain reachable through [`ConnectionProfileRepository::find_by_id`].

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use thiserror::Error;

use crate::models::connection_profile::{self, Entity as ConnectionProfile};

/// Errors raised by profile writes
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ya existe una conexión con el nombre '{0}'")]
    DuplicateName(String),
    #[error("conexión con ID {0} no encontrada")]
    NotFound(i32),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Writable profile attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub server_name: String,
    pub host: String,
    pub port: i32,
    pub database_name: String,
    pub username: String,
    pub password: String,
    pub is_active: bool,
    pub description: Option<String>,
}

/// Repository for connection profile operations
#[derive(Debug, Clone)]
pub struct ConnectionProfileRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ConnectionProfileRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts a profile after checking that its name is free.
    pub async fn create(&self, fields: ProfileFields) -> Result<connection_profile::Model, StoreError> {
        if self.name_taken(&fields.server_name, None).await? {
            return Err(StoreError::DuplicateName(fields.server_name));
        }

        let now = Utc::now().into();
        let profile = connection_profile::ActiveModel {
            server_name: Set(fields.server_name),
            host: Set(fields.host),
            port: Set(fields.port),
            database_name: Set(fields.database_name),
            username: Set(fields.username),
            password: Set(fields.password),
            is_active: Set(fields.is_active),
            description: Set(fields.description),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        Ok(profile.insert(&*self.db).await?)
    }

    /// Looks a profile up by id, soft-deleted rows included.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<connection_profile::Model>, DbErr> {
        ConnectionProfile::find_by_id(id).one(&*self.db).await
    }

    /// Looks a live (not soft-deleted) profile up by id.
    pub async fn find_live_by_id(
        &self,
        id: i32,
    ) -> Result<Option<connection_profile::Model>, DbErr> {
        ConnectionProfile::find_by_id(id)
            .filter(connection_profile::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await
    }

    pub async fn find_by_server_name(
        &self,
        server_name: &str,
    ) -> Result<Option<connection_profile::Model>, DbErr> {
        ConnectionProfile::find()
            .filter(connection_profile::Column::ServerName.eq(server_name))
            .filter(connection_profile::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await
    }

    /// All live profiles ordered by name.
    pub async fn list_all(&self) -> Result<Vec<connection_profile::Model>, DbErr> {
        ConnectionProfile::find()
            .filter(connection_profile::Column::DeletedAt.is_null())
            .order_by_asc(connection_profile::Column::ServerName)
            .all(&*self.db)
            .await
    }

    pub async fn list_active(&self) -> Result<Vec<connection_profile::Model>, DbErr> {
        ConnectionProfile::find()
            .filter(connection_profile::Column::DeletedAt.is_null())
            .filter(connection_profile::Column::IsActive.eq(true))
            .order_by_asc(connection_profile::Column::ServerName)
            .all(&*self.db)
            .await
    }

    /// One page of live profiles plus the total number of live profiles.
    pub async fn list_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<connection_profile::Model>, u64), DbErr> {
        let total = self.count().await?;
        if offset >= total {
            return Ok((Vec::new(), total));
        }

        let rows = ConnectionProfile::find()
            .filter(connection_profile::Column::DeletedAt.is_null())
            .order_by_asc(connection_profile::Column::ServerName)
            .order_by_asc(connection_profile::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok((rows, total))
    }

    /// Replaces every writable attribute of an existing profile.
    pub async fn update(
        &self,
        id: i32,
        fields: ProfileFields,
    ) -> Result<connection_profile::Model, StoreError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        if self.name_taken(&fields.server_name, Some(id)).await? {
            return Err(StoreError::DuplicateName(fields.server_name));
        }

        let mut profile: connection_profile::ActiveModel = existing.into();
        profile.server_name = Set(fields.server_name);
        profile.host = Set(fields.host);
        profile.port = Set(fields.port);
        profile.database_name = Set(fields.database_name);
        profile.username = Set(fields.username);
        profile.password = Set(fields.password);
        profile.is_active = Set(fields.is_active);
        profile.description = Set(fields.description);
        profile.updated_at = Set(Utc::now().into());

        Ok(profile.update(&*self.db).await?)
    }

    /// Sets the soft-delete marker on a live profile.
    pub async fn soft_delete(&self, id: i32) -> Result<(), StoreError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = ConnectionProfile::update_many()
            .col_expr(connection_profile::Column::DeletedAt, Expr::value(now))
            .col_expr(connection_profile::Column::UpdatedAt, Expr::value(now))
            .filter(connection_profile::Column::Id.eq(id))
            .filter(connection_profile::Column::DeletedAt.is_null())
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Removes the row, whether or not it was soft-deleted.
    pub async fn hard_delete(&self, id: i32) -> Result<(), StoreError> {
        let result = ConnectionProfile::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        ConnectionProfile::find()
            .filter(connection_profile::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await
    }

    pub async fn count_active(&self) -> Result<u64, DbErr> {
        ConnectionProfile::find()
            .filter(connection_profile::Column::DeletedAt.is_null())
            .filter(connection_profile::Column::IsActive.eq(true))
            .count(&*self.db)
            .await
    }

    async fn name_taken(&self, server_name: &str, exclude_id: Option<i32>) -> Result<bool, DbErr> {
        let mut query = ConnectionProfile::find()
            .filter(connection_profile::Column::ServerName.eq(server_name))
            .filter(connection_profile::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            query = query.filter(connection_profile::Column::Id.ne(id));
        }
        Ok(query.count(&*self.db).await? > 0)
    }
}
