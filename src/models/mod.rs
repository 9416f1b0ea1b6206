//! # Data Models
//!
//! This module contains the SeaORM entities of the local metadata store.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod connection_profile;
pub mod product_code;

pub use connection_profile::Entity as ConnectionProfile;
pub use product_code::Entity as ProductCode;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "invoice-gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
