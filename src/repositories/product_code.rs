//! Product code repository (read-only)

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

use crate::models::product_code::{self, Entity as ProductCode};

#[derive(Debug, Clone)]
pub struct ProductCodeRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ProductCodeRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Live product codes ordered by code.
    pub async fn find_all(&self) -> Result<Vec<product_code::Model>, DbErr> {
        ProductCode::find()
            .filter(product_code::Column::DeletedAt.is_null())
            .order_by_asc(product_code::Column::Codigo)
            .all(&*self.db)
            .await
    }

    pub async fn find_by_codigo(&self, codigo: &str) -> Result<Option<product_code::Model>, DbErr> {
        ProductCode::find()
            .filter(product_code::Column::Codigo.eq(codigo))
            .filter(product_code::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await
    }
}
