//! Common test utilities and helpers

use pharos_core::settings::{Catalog, CategoryRecord, FeedRecord, SettingsStore};
use pharos_core::storage::{self, ConnectionMode};
use pharos_core::{CategoryId, FeedId, UserId};
use std::sync::Arc;
use tempfile::TempDir;

/// A file-backed test database.
///
/// Uses a temporary file instead of :memory: because libSQL's :memory: mode
/// creates isolated databases per connection, and the stores open a
/// connection per operation. The TempDir keeps the file alive for the
/// duration of the test.
pub struct TestDb {
    pub db: Arc<libsql::Database>,
    _dir: TempDir,
}

pub async fn create_test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("pharos_test.db");

    let db = Arc::new(
        storage::open(&ConnectionMode::Local(
            path.to_str().unwrap().to_string(),
        ))
        .await
        .expect("Failed to open test database"),
    );
    storage::init_schema(&db).await.expect("Failed to init schema");

    TestDb { db, _dir: dir }
}

/// One user with one categorized feed, ready for settings tests
#[allow(dead_code)]
pub struct CatalogFixture {
    pub settings: SettingsStore,
    pub user: UserId,
    pub category: CategoryId,
    pub feed: FeedId,
}

#[allow(dead_code)]
pub async fn create_catalog_fixture(test_db: &TestDb) -> CatalogFixture {
    let catalog = Catalog::new(test_db.db.clone());

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
        category_id: Some(category.id),
        title: "Example Feed".to_string(),
        url: "https://example.com/rss".to_string(),
    };
    catalog.register_feed(&feed).await.unwrap();

    CatalogFixture {
        settings: SettingsStore::new(test_db.db.clone(), catalog),
        user,
        category: category.id,
        feed: feed.id,
    }
}
