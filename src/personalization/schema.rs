//! Database schema for the personalization subsystem.
//!
//! Creates tables for:
//! - patterns: per-user, per-keyword learned weights
//! - feedback_events: audit log of ingested events, kept for stat
//!   recomputation

use crate::error::Result;
use libsql::Connection;

/// Initialize personalization database tables
///
/// Safe to call multiple times (uses IF NOT EXISTS).
pub async fn init_personalization_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS patterns (
            user_id TEXT NOT NULL,
            keyword TEXT NOT NULL,
            weight REAL NOT NULL,
            feedback_count INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, keyword)
        )
        "#,
        libsql::params![],
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_patterns_user ON patterns(user_id)",
        libsql::params![],
    )
    .await?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS feedback_events (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            article_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            keywords TEXT NOT NULL,
            occurred_at INTEGER NOT NULL,
            ingested_at INTEGER NOT NULL
        )
        "#,
        libsql::params![],
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_feedback_user ON feedback_events(user_id)",
        libsql::params![],
    )
    .await?;

    tracing::debug!("Personalization database schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_schema() {
        let db = libsql::Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();

        init_personalization_tables(&conn).await.expect("init schema");
        init_personalization_tables(&conn)
            .await
            .expect("re-init schema");

        let result = conn
            .query("SELECT COUNT(*) FROM patterns", libsql::params![])
            .await;
        assert!(result.is_ok());
    }
}
