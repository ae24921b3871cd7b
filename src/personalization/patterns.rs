//! Persistent per-user keyword patterns.
//!
//! Each pattern row holds a weight in [-1, 1] plus an interaction count.
//! Weight updates are pushed into a single SQL upsert with the clamp inside
//! the statement, so concurrent increments for the same (user, keyword)
//! serialize at the storage engine and are never lost to a read-modify-write
//! race. Reset-learning deletes a user's rows and audit log in one
//! transaction while holding the store's write gate, making it atomic
//! relative to in-flight ingestion.

use crate::error::{PharosError, Result};
use crate::types::{FeedbackEvent, Pattern, UserId};
use chrono::{DateTime, TimeZone, Utc};
use libsql::Database;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Pattern store over libsql
#[derive(Clone)]
pub struct PatternStore {
    db: Arc<Database>,
    /// Per-user reset markers. Feedback application holds the read side
    /// across its transaction; reset holds the write side, which both
    /// excludes concurrent applies and records when the wipe happened so
    /// stale events that raced the reset can be detected and dropped.
    resets: Arc<RwLock<HashMap<UserId, DateTime<Utc>>>>,
}

impl PatternStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            resets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Apply one feedback event to the user's patterns.
    ///
    /// For each distinct keyword, the pattern row is created lazily on
    /// first reference; existing rows get `weight + delta` clamped to
    /// [-1, 1] and `feedback_count + 1`. The pattern upserts and the audit
    /// row are one transaction.
    ///
    /// Returns [`PharosError::ConcurrentResetRace`] when the event predates
    /// a reset-learning wipe for this user; the caller may drop such an
    /// event silently (the rows are untouched — a pre-reset signal must not
    /// resurrect wiped learning).
    pub async fn apply_feedback(&self, event: &FeedbackEvent, keywords: &[String]) -> Result<()> {
        let gate = self.resets.read().await;
        if let Some(reset_at) = gate.get(&event.user_id) {
            if event.occurred_at < *reset_at {
                return Err(PharosError::ConcurrentResetRace(format!(
                    "event for user {} occurred at {} but learning was reset at {}",
                    event.user_id, event.occurred_at, reset_at
                )));
            }
        }

        let delta = event.kind.delta();
        let now = Utc::now().timestamp();

        let conn = self.db.connect()?;
        let tx = conn.transaction().await?;

        for keyword in keywords {
            tx.execute(
                r#"
                INSERT INTO patterns (user_id, keyword, weight, feedback_count, updated_at)
                VALUES (?, ?, MAX(-1.0, MIN(1.0, ?)), 1, ?)
                ON CONFLICT (user_id, keyword)
                DO UPDATE SET
                    weight = MAX(-1.0, MIN(1.0, weight + ?)),
                    feedback_count = feedback_count + 1,
                    updated_at = ?
                "#,
                libsql::params![
                    event.user_id.to_string(),
                    keyword.clone(),
                    delta,
                    now,
                    delta,
                    now
                ],
            )
            .await?;
        }

        tx.execute(
            r#"
            INSERT INTO feedback_events (id, user_id, article_id, kind, keywords, occurred_at, ingested_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            libsql::params![
                Uuid::new_v4().to_string(),
                event.user_id.to_string(),
                event.article_id.to_string(),
                event.kind.to_string(),
                serde_json::to_string(keywords)?,
                event.occurred_at.timestamp(),
                now
            ],
        )
        .await?;

        tx.commit().await?;
        drop(gate);

        debug!(
            "Applied {} feedback for user {} across {} keywords",
            event.kind,
            event.user_id,
            keywords.len()
        );
        Ok(())
    }

    /// Patterns applying to the given keyword set, keyed by keyword.
    ///
    /// Hot-path read for the ranker. Malformed rows (NaN or out-of-range
    /// weight) are skipped with a warning rather than failing the call —
    /// ranking quality is a soft concern and total failure would be worse
    /// than a slightly-off score.
    pub async fn patterns_for(
        &self,
        user_id: UserId,
        keywords: &[String],
    ) -> Result<HashMap<String, Pattern>> {
        let wanted: HashSet<&str> = keywords.iter().map(String::as_str).collect();
        let mut patterns = HashMap::new();

        for pattern in self.all_patterns(user_id).await? {
            if wanted.contains(pattern.keyword.as_str()) {
                patterns.insert(pattern.keyword.clone(), pattern);
            }
        }
        Ok(patterns)
    }

    /// All of a user's patterns, strongest first
    pub async fn all_patterns(&self, user_id: UserId) -> Result<Vec<Pattern>> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                r#"
                SELECT keyword, weight, feedback_count, updated_at
                FROM patterns WHERE user_id = ?
                ORDER BY ABS(weight) DESC, keyword ASC
                "#,
                libsql::params![user_id.to_string()],
            )
            .await?;

        let mut patterns = Vec::new();
        while let Some(row) = rows.next().await? {
            let keyword: String = row.get(0)?;
            let weight: f64 = row.get(1)?;
            let feedback_count: i64 = row.get(2)?;
            let updated_at: i64 = row.get(3)?;

            if !weight.is_finite() || !(-1.0..=1.0).contains(&weight) || feedback_count < 0 {
                warn!(
                    "Skipping malformed pattern row for user {} keyword '{}' (weight {}, count {})",
                    user_id, keyword, weight, feedback_count
                );
                continue;
            }

            patterns.push(Pattern {
                user_id,
                keyword,
                weight,
                feedback_count: feedback_count as u32,
                updated_at: Utc
                    .timestamp_opt(updated_at, 0)
                    .single()
                    .unwrap_or_else(Utc::now),
            });
        }
        Ok(patterns)
    }

    /// Total feedback events accumulated across all of a user's patterns
    pub async fn total_feedback(&self, user_id: UserId) -> Result<u64> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT COALESCE(SUM(feedback_count), 0) FROM patterns WHERE user_id = ?",
                libsql::params![user_id.to_string()],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| PharosError::Database("aggregate query returned no row".to_string()))?;
        let total: i64 = row.get(0)?;
        Ok(total.max(0) as u64)
    }

    /// Delete every pattern row and audit event for a user.
    ///
    /// Holds the write gate for the duration, so no feedback write is in
    /// flight while the wipe runs; from any concurrent reader's point of
    /// view either all rows are gone or none are. Returns the number of
    /// pattern rows deleted.
    pub async fn reset(&self, user_id: UserId) -> Result<u64> {
        let mut gate = self.resets.write().await;

        let conn = self.db.connect()?;
        let tx = conn.transaction().await?;
        let deleted = tx
            .execute(
                "DELETE FROM patterns WHERE user_id = ?",
                libsql::params![user_id.to_string()],
            )
            .await?;
        tx.execute(
            "DELETE FROM feedback_events WHERE user_id = ?",
            libsql::params![user_id.to_string()],
        )
        .await?;
        tx.commit().await?;

        gate.insert(user_id, Utc::now());
        info!("Reset learning for user {}: {} patterns deleted", user_id, deleted);
        Ok(deleted)
    }
}
