//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations on the local
//! metadata store.

pub mod connection_profile;
pub mod product_code;

pub use connection_profile::{ConnectionProfileRepository, ProfileFields, StoreError};
pub use product_code::ProductCodeRepository;
