//! Database seeding functionality
//!
//! Optional sample data for a freshly migrated local store.

pub mod profiles;

pub use profiles::seed_sample_profiles;
