//! Minimal ownership graph for scope validation.
//!
//! Feed and category CRUD proper belongs to an external collaborator, but
//! settings writes must reject scopes that don't exist and effective-value
//! resolution must chain feed → category → user. This catalog stores just
//! enough rows to support both.

use crate::error::{PharosError, Result};
use crate::types::{CategoryId, FeedId, UserId};
use chrono::Utc;
use libsql::Database;
use std::sync::Arc;
use tracing::debug;

/// One subscribed feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    pub id: FeedId,
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub url: String,
}

/// One feed category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub user_id: UserId,
    pub title: String,
}

/// Catalog of users, categories, and feeds
#[derive(Clone)]
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a user (idempotent)
    pub async fn register_user(&self, id: UserId) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (id, created_at) VALUES (?, ?)",
            libsql::params![id.to_string(), Utc::now().timestamp()],
        )
        .await?;
        debug!("Registered user {}", id);
        Ok(())
    }

    /// Register a category; the owning user must exist
    pub async fn register_category(&self, category: &CategoryRecord) -> Result<()> {
        if !self.user_exists(category.user_id).await? {
            return Err(PharosError::UnknownScope(format!(
                "user:{}",
                category.user_id
            )));
        }

        let conn = self.db.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO categories (id, user_id, title, created_at) VALUES (?, ?, ?, ?)",
            libsql::params![
                category.id.to_string(),
                category.user_id.to_string(),
                category.title.clone(),
                Utc::now().timestamp()
            ],
        )
        .await?;
        debug!("Registered category {}", category.id);
        Ok(())
    }

    /// Register a feed; the owning user and any category must exist
    pub async fn register_feed(&self, feed: &FeedRecord) -> Result<()> {
        if !self.user_exists(feed.user_id).await? {
            return Err(PharosError::UnknownScope(format!("user:{}", feed.user_id)));
        }
        if let Some(category_id) = feed.category_id {
            if self.get_category(category_id).await?.is_none() {
                return Err(PharosError::UnknownScope(format!(
                    "category:{}",
                    category_id
                )));
            }
        }

        let conn = self.db.connect()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO feeds (id, user_id, category_id, title, url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            libsql::params![
                feed.id.to_string(),
                feed.user_id.to_string(),
                feed.category_id.map(|c| c.to_string()),
                feed.title.clone(),
                feed.url.clone(),
                Utc::now().timestamp()
            ],
        )
        .await?;
        debug!("Registered feed {}", feed.id);
        Ok(())
    }

    /// Move a feed into (or out of) a category
    pub async fn assign_category(
        &self,
        feed_id: FeedId,
        category_id: Option<CategoryId>,
    ) -> Result<()> {
        if let Some(category_id) = category_id {
            if self.get_category(category_id).await?.is_none() {
                return Err(PharosError::UnknownScope(format!(
                    "category:{}",
                    category_id
                )));
            }
        }

        let conn = self.db.connect()?;
        let changed = conn
            .execute(
                "UPDATE feeds SET category_id = ? WHERE id = ?",
                libsql::params![category_id.map(|c| c.to_string()), feed_id.to_string()],
            )
            .await?;

        if changed == 0 {
            return Err(PharosError::UnknownScope(format!("feed:{}", feed_id)));
        }
        Ok(())
    }

    pub async fn user_exists(&self, id: UserId) -> Result<bool> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT 1 FROM users WHERE id = ? LIMIT 1",
                libsql::params![id.to_string()],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Fetch one feed, or None if it doesn't exist
    pub async fn get_feed(&self, id: FeedId) -> Result<Option<FeedRecord>> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, category_id, title, url FROM feeds WHERE id = ?",
                libsql::params![id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_feed(&row)?)),
            None => Ok(None),
        }
    }

    /// Fetch one category, or None if it doesn't exist
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<CategoryRecord>> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, title FROM categories WHERE id = ?",
                libsql::params![id.to_string()],
            )
            .await?;

        let row = match rows.next().await? {
            Some(row) => row,
            None => return Ok(None),
        };

        let id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let title: String = row.get(2)?;

        Ok(Some(CategoryRecord {
            id: CategoryId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            title,
        }))
    }

    /// All feeds in a category
    pub async fn feeds_for_category(&self, id: CategoryId) -> Result<Vec<FeedRecord>> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, category_id, title, url FROM feeds WHERE category_id = ?",
                libsql::params![id.to_string()],
            )
            .await?;

        let mut feeds = Vec::new();
        while let Some(row) = rows.next().await? {
            feeds.push(Self::row_to_feed(&row)?);
        }
        Ok(feeds)
    }

    /// All feeds owned by a user
    pub async fn feeds_for_user(&self, id: UserId) -> Result<Vec<FeedRecord>> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, category_id, title, url FROM feeds WHERE user_id = ?",
                libsql::params![id.to_string()],
            )
            .await?;

        let mut feeds = Vec::new();
        while let Some(row) = rows.next().await? {
            feeds.push(Self::row_to_feed(&row)?);
        }
        Ok(feeds)
    }

    fn row_to_feed(row: &libsql::Row) -> Result<FeedRecord> {
        let id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let category_id: Option<String> = row.get(2)?;
        let title: String = row.get(3)?;
        let url: String = row.get(4)?;

        Ok(FeedRecord {
            id: FeedId::from_string(&id)?,
            user_id: UserId::from_string(&user_id)?,
            category_id: category_id
                .map(|c| CategoryId::from_string(&c))
                .transpose()?,
            title,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::test_db;

    async fn test_catalog() -> Catalog {
        Catalog::new(test_db().await)
    }

    #[tokio::test]
    async fn test_register_and_fetch_feed() {
        let catalog = test_catalog().await;
        let user = UserId::new();
        catalog.register_user(user).await.unwrap();

        let feed = FeedRecord {
            id: FeedId::new(),
            user_id: user,
            category_id: None,
            title: "Example".to_string(),
            url: "https://example.com/rss".to_string(),
        };
        catalog.register_feed(&feed).await.unwrap();

        let fetched = catalog.get_feed(feed.id).await.unwrap().unwrap();
        assert_eq!(fetched, feed);
    }

    #[tokio::test]
    async fn test_feed_requires_existing_user() {
        let catalog = test_catalog().await;

        let feed = FeedRecord {
            id: FeedId::new(),
            user_id: UserId::new(),
            category_id: None,
            title: "Orphan".to_string(),
            url: "https://example.com/rss".to_string(),
        };
        let result = catalog.register_feed(&feed).await;
        assert!(matches!(result, Err(PharosError::UnknownScope(_))));
    }

    #[tokio::test]
    async fn test_assign_category_validates_both_sides() {
        let catalog = test_catalog().await;
        let user = UserId::new();
        catalog.register_user(user).await.unwrap();

        let category = CategoryRecord {
            id: CategoryId::new(),
            user_id: user,
            title: "Tech".to_string(),
        };
        catalog.register_category(&category).await.unwrap();

        let feed = FeedRecord {
            id: FeedId::new(),
            user_id: user,
            category_id: None,
            title: "Example".to_string(),
            url: "https://example.com/rss".to_string(),
        };
        catalog.register_feed(&feed).await.unwrap();

        catalog
            .assign_category(feed.id, Some(category.id))
            .await
            .unwrap();
        let fetched = catalog.get_feed(feed.id).await.unwrap().unwrap();
        assert_eq!(fetched.category_id, Some(category.id));

        // Nonexistent category rejected
        let result = catalog
            .assign_category(feed.id, Some(CategoryId::new()))
            .await;
        assert!(matches!(result, Err(PharosError::UnknownScope(_))));

        // Nonexistent feed rejected
        let result = catalog.assign_category(FeedId::new(), None).await;
        assert!(matches!(result, Err(PharosError::UnknownScope(_))));
    }

    #[tokio::test]
    async fn test_feeds_for_category_and_user() {
        let catalog = test_catalog().await;
        let user = UserId::new();
        catalog.register_user(user).await.unwrap();

        let category = CategoryRecord {
            id: CategoryId::new(),
            user_id: user,
            title: "News".to_string(),
        };
        catalog.register_category(&category).await.unwrap();

        for i in 0..3 {
            let feed = FeedRecord {
                id: FeedId::new(),
                user_id: user,
                category_id: (i < 2).then_some(category.id),
                title: format!("Feed {}", i),
                url: format!("https://example.com/{}", i),
            };
            catalog.register_feed(&feed).await.unwrap();
        }

        assert_eq!(catalog.feeds_for_category(category.id).await.unwrap().len(), 2);
        assert_eq!(catalog.feeds_for_user(user).await.unwrap().len(), 3);
    }
}
