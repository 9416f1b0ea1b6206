//! Sample connection profiles
//!
//! Bootstraps an empty profile table with two example servers so a fresh
//! deployment has something to list. Runs only when explicitly enabled and
//! skips the live connection test.

use anyhow::Result;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::models::connection_profile::DEFAULT_PORT;
use crate::repositories::{ConnectionProfileRepository, ProfileFields};

/// Inserts the sample profiles when the table has no live rows.
///
/// Returns the number of profiles created. A profile that fails to insert is
/// logged and skipped.
pub async fn seed_sample_profiles(db: &DatabaseConnection) -> Result<usize> {
    let repo = ConnectionProfileRepository::new(Arc::new(db.clone()));

    let existing = repo.count().await?;
    if existing > 0 {
        log::info!("Found {} connection profiles, skipping sample data", existing);
        return Ok(0);
    }

    log::info!("No connection profiles found, adding sample data");

    let mut created = 0;
    for sample in sample_profiles() {
        let name = sample.server_name.clone();
        match repo.create(sample).await {
            Ok(profile) => {
                log::info!("Created sample profile '{}' (id {})", name, profile.id);
                created += 1;
            }
            Err(e) => {
                log::warn!("Failed to create sample profile '{}': {}", name, e);
            }
        }
    }

    Ok(created)
}

fn sample_profiles() -> Vec<ProfileFields> {
    vec![
        ProfileFields {
            server_name: "Servidor Principal".to_string(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            database_name: "FacturasDB".to_string(),
            username: "sa".to_string(),
            password: "your_password_here".to_string(),
            is_active: true,
            description: Some("Servidor principal de facturas".to_string()),
        },
        ProfileFields {
            server_name: "Servidor Backup".to_string(),
            host: "backup.example.com".to_string(),
            port: DEFAULT_PORT,
            database_name: "FacturasDB_Backup".to_string(),
            username: "backup_user".to_string(),
            password: "backup_password_here".to_string(),
            is_active: false,
            description: Some("Servidor de respaldo".to_string()),
        },
    ]
}
