//! Product code entity model
//!
//! Static lookup of product codes used to filter invoice lines.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "db_codigo_producto")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Product code as used by the remote invoice lines (`codigo_producto_sfe`)
    pub codigo: String,

    pub descripcion: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,

    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
