//! Storage layer for the Pharos feed personalization system
//!
//! Provides the shared libSQL plumbing: connection modes, database-file
//! validation, and idempotent schema initialization for the settings and
//! personalization subsystems.

use crate::error::{PharosError, Result};
use libsql::{Builder, Database};
use tracing::{debug, info};

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// In-memory database (for testing)
    InMemory,
}

/// Validate a local database file before opening.
///
/// SQLite files start with the 16-byte header "SQLite format 3\0"; anything
/// else at that path is corrupted or not a database. Returns `Ok(false)`
/// when the file simply doesn't exist yet.
fn validate_database_file(db_path: &str) -> Result<bool> {
    use std::fs;
    use std::path::Path;

    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(false);
    }

    let bytes = fs::read(path).map_err(|e| {
        PharosError::Database(format!(
            "Cannot read database file at '{}': {}. The file may be corrupted or inaccessible.",
            db_path, e
        ))
    })?;

    if bytes.len() < 16 || &bytes[0..16] != b"SQLite format 3\0" {
        return Err(PharosError::Database(format!(
            "Database file at '{}' is corrupted or not a valid SQLite database. \
             Please delete it and run 'pharos init' to reinitialize.",
            db_path
        )));
    }

    debug!("Database file validation passed: {}", db_path);
    Ok(true)
}

/// Open a database in the given mode.
///
/// Local paths are validated first; the parent directory is created when
/// the database doesn't exist yet.
pub async fn open(mode: &ConnectionMode) -> Result<Database> {
    match mode {
        ConnectionMode::Local(path) => {
            let exists = validate_database_file(path)?;
            if !exists {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            PharosError::Database(format!(
                                "Failed to create database directory {}: {}",
                                parent.display(),
                                e
                            ))
                        })?;
                    }
                }
            }

            Builder::new_local(path).build().await.map_err(|e| {
                PharosError::Database(format!("Failed to create local database: {}", e))
            })
        }
        ConnectionMode::InMemory => Builder::new_local(":memory:").build().await.map_err(|e| {
            PharosError::Database(format!("Failed to create in-memory database: {}", e))
        }),
    }
}

/// Initialize all Pharos tables.
///
/// Safe to call repeatedly; every initializer uses IF NOT EXISTS.
pub async fn init_schema(db: &Database) -> Result<()> {
    let conn = db.connect()?;
    crate::settings::schema::init_settings_tables(&conn).await?;
    crate::personalization::schema::init_personalization_tables(&conn).await?;
    info!("Database schema initialized");
    Ok(())
}
