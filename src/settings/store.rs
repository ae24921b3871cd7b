//! Persistent settings overrides.
//!
//! Overrides are stored sparsely, one row per (scope, scope_id, field).
//! A multi-field write is applied inside a single transaction so readers
//! never observe a partially-updated scope; reverting a field to "inherit"
//! deletes its row outright.

use crate::error::{PharosError, Result};
use crate::settings::catalog::{Catalog, FeedRecord};
use crate::settings::fields::{ScopeOverride, FIELD_NAMES};
use crate::settings::resolver::{self, EffectiveSettings, OverrideChain};
use crate::types::{CategoryId, FeedId, Scope, UserId};
use chrono::Utc;
use libsql::Database;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings store over sparse override rows
#[derive(Clone)]
pub struct SettingsStore {
    db: Arc<Database>,
    catalog: Catalog,
}

impl SettingsStore {
    pub fn new(db: Arc<Database>, catalog: Catalog) -> Self {
        Self { db, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replace a scope's override record.
    ///
    /// Validates bounds first (rejected writes leave the previous effective
    /// values in force), then verifies the scope instance exists. Fields
    /// present in `overrides` are upserted; absent fields are reverted to
    /// "inherit" by deleting their rows. The whole write is one
    /// transaction — atomic as a set from any reader's point of view.
    pub async fn put_override(
        &self,
        scope: Scope,
        scope_id: &str,
        overrides: &ScopeOverride,
    ) -> Result<()> {
        overrides.validate()?;
        self.ensure_scope_exists(scope, scope_id).await?;

        let now = Utc::now().timestamp();
        let conn = self.db.connect()?;
        let tx = conn.transaction().await?;

        for field in FIELD_NAMES {
            match overrides.stored_value(field) {
                Some(value) => {
                    tx.execute(
                        r#"
                        INSERT INTO settings_overrides (scope, scope_id, field, value, updated_at)
                        VALUES (?, ?, ?, ?, ?)
                        ON CONFLICT (scope, scope_id, field)
                        DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                        "#,
                        libsql::params![scope.to_string(), scope_id, field, value, now],
                    )
                    .await?;
                }
                None => {
                    tx.execute(
                        "DELETE FROM settings_overrides WHERE scope = ? AND scope_id = ? AND field = ?",
                        libsql::params![scope.to_string(), scope_id, field],
                    )
                    .await?;
                }
            }
        }

        tx.commit().await?;
        info!("Stored {} override for {}:{}", scope, scope, scope_id);
        Ok(())
    }

    /// Revert a whole scope instance to "inherit"
    pub async fn clear_override(&self, scope: Scope, scope_id: &str) -> Result<()> {
        self.ensure_scope_exists(scope, scope_id).await?;

        let conn = self.db.connect()?;
        let deleted = conn
            .execute(
                "DELETE FROM settings_overrides WHERE scope = ? AND scope_id = ?",
                libsql::params![scope.to_string(), scope_id],
            )
            .await?;
        debug!("Cleared {} override rows for {}:{}", deleted, scope, scope_id);
        Ok(())
    }

    /// Load a scope's override record; None when nothing is overridden
    pub async fn get_override(&self, scope: Scope, scope_id: &str) -> Result<Option<ScopeOverride>> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT field, value FROM settings_overrides WHERE scope = ? AND scope_id = ?",
                libsql::params![scope.to_string(), scope_id],
            )
            .await?;

        let mut overrides = ScopeOverride::default();
        let mut any = false;
        while let Some(row) = rows.next().await? {
            let field: String = row.get(0)?;
            let value: String = row.get(1)?;
            overrides.set_stored_value(&field, &value)?;
            any = true;
        }

        Ok(any.then_some(overrides))
    }

    /// Effective settings for one feed, with per-field provenance
    pub async fn effective_for_feed(&self, feed_id: FeedId) -> Result<EffectiveSettings> {
        let feed = self
            .catalog
            .get_feed(feed_id)
            .await?
            .ok_or_else(|| PharosError::NotFound(format!("feed {}", feed_id)))?;
        self.effective_for_feed_record(&feed).await
    }

    /// Effective settings for an already-loaded feed record
    pub async fn effective_for_feed_record(&self, feed: &FeedRecord) -> Result<EffectiveSettings> {
        let feed_override = self.get_override(Scope::Feed, &feed.id.to_string()).await?;
        let category_override = match feed.category_id {
            Some(category_id) => {
                self.get_override(Scope::Category, &category_id.to_string())
                    .await?
            }
            None => None,
        };
        let user_override = self
            .get_override(Scope::User, &feed.user_id.to_string())
            .await?;

        resolver::resolve(OverrideChain {
            feed: feed_override.as_ref(),
            category: category_override.as_ref(),
            user: user_override.as_ref(),
        })
    }

    /// Feeds whose effective settings a write to this scope can change
    pub async fn feeds_affected_by(&self, scope: Scope, scope_id: &str) -> Result<Vec<FeedRecord>> {
        match scope {
            Scope::Feed => {
                let feed_id = FeedId::from_string(scope_id)?;
                match self.catalog.get_feed(feed_id).await? {
                    Some(feed) => Ok(vec![feed]),
                    None => Ok(Vec::new()),
                }
            }
            Scope::Category => {
                let category_id = CategoryId::from_string(scope_id)?;
                self.catalog.feeds_for_category(category_id).await
            }
            Scope::User => {
                let user_id = UserId::from_string(scope_id)?;
                self.catalog.feeds_for_user(user_id).await
            }
            Scope::System => Ok(Vec::new()),
        }
    }

    async fn ensure_scope_exists(&self, scope: Scope, scope_id: &str) -> Result<()> {
        let exists = match scope {
            Scope::Feed => {
                let id = FeedId::from_string(scope_id)?;
                self.catalog.get_feed(id).await?.is_some()
            }
            Scope::Category => {
                let id = CategoryId::from_string(scope_id)?;
                self.catalog.get_category(id).await?.is_some()
            }
            Scope::User => {
                let id = UserId::from_string(scope_id)?;
                self.catalog.user_exists(id).await?
            }
            // System defaults are hard-coded, never stored
            Scope::System => false,
        };

        if !exists {
            return Err(PharosError::UnknownScope(format!("{}:{}", scope, scope_id)));
        }
        Ok(())
    }
}
