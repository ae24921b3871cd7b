//! Database schema for the settings subsystem.
//!
//! Creates tables for:
//! - users/categories/feeds: the ownership graph scope validation needs
//! - settings_overrides: sparse per-(scope, scope_id, field) override rows

use crate::error::Result;
use libsql::Connection;

/// Initialize settings database tables
///
/// Safe to call multiple times (uses IF NOT EXISTS).
pub async fn init_settings_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        )
        "#,
        libsql::params![],
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
        libsql::params![],
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS feeds (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            category_id TEXT REFERENCES categories(id),
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
        libsql::params![],
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_feeds_user ON feeds(user_id)",
        libsql::params![],
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_feeds_category ON feeds(category_id)",
        libsql::params![],
    )
    .await?;

    // Sparse overrides: one row per overridden field. Reverting a field to
    // "inherit" deletes its row rather than storing an empty value.
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS settings_overrides (
            scope TEXT NOT NULL,
            scope_id TEXT NOT NULL,
            field TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (scope, scope_id, field)
        )
        "#,
        libsql::params![],
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_overrides_scope ON settings_overrides(scope, scope_id)",
        libsql::params![],
    )
    .await?;

    tracing::debug!("Settings database schema initialized");
    Ok(())
}
