//! Product code lookups.

use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::product_code;
use crate::repositories::ProductCodeRepository;

/// Product code as exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductCodeInfo {
    pub id: i32,
    pub codigo: String,
    pub descripcion: String,
}

impl From<product_code::Model> for ProductCodeInfo {
    fn from(model: product_code::Model) -> Self {
        Self {
            id: model.id,
            codigo: model.codigo,
            descripcion: model.descripcion,
        }
    }
}

pub struct ProductCodeService {
    repo: ProductCodeRepository,
}

impl ProductCodeService {
    pub fn new(repo: ProductCodeRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<ProductCodeInfo>, DbErr> {
        let codes = self.repo.find_all().await?;
        Ok(codes.into_iter().map(ProductCodeInfo::from).collect())
    }

    pub async fn get(&self, codigo: &str) -> Result<Option<ProductCodeInfo>, DbErr> {
        Ok(self
            .repo
            .find_by_codigo(codigo.trim())
            .await?
            .map(ProductCodeInfo::from))
    }
}
