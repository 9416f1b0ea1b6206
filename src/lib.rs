//! # Invoice Gateway Library
//!
//! Connection profile registry for remote SQL Server instances and invoice
//! lookups against them: handlers, services, the remote driver seam and
//! server wiring.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod services;
pub mod telemetry;
pub mod validation;
pub use migration;
