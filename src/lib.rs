//! Pharos - Personalized Feed Decision Core
//!
//! The decision logic behind a personalized article feed:
//! - Hierarchical settings resolution (feed > category > user > system)
//!   with per-field provenance
//! - Implicit-feedback learning: reading signals become per-keyword
//!   weighted patterns
//! - Relevance ranking blending base scores, learned patterns, and
//!   recency decay, behind a cold-start gate
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Core data structures (ids, scopes, events, patterns)
//! - **Settings**: Override storage and the precedence resolver
//! - **Personalization**: Pattern store, ingestion, ranker, gate
//! - **Api**: HTTP surface consumed by the feed scheduler and clients
//!
//! # Example
//!
//! ```ignore
//! use pharos_core::personalization::{PersonalizationEngine, RankParams};
//! use pharos_core::storage::{self, ConnectionMode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = std::sync::Arc::new(storage::open(&ConnectionMode::Local("pharos.db".into())).await?);
//!     storage::init_schema(&db).await?;
//!
//!     let engine = PersonalizationEngine::new(db, &Default::default());
//!     engine.ingest(&event).await?;
//!
//!     let ranked = engine
//!         .rank_for_user(user_id, &candidates, &RankParams {
//!             recency_weight: 0.3,
//!             recency_decay_days: 7,
//!         }, chrono::Utc::now())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod personalization;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::PharosConfig;
pub use error::{PharosError, Result};
pub use personalization::{PersonalizationEngine, PersonalizationGate, RankParams};
pub use settings::{EffectiveSettings, ScopeOverride, SettingsStore};
pub use types::{
    ArticleId, Candidate, CategoryId, FeedId, FeedbackEvent, FeedbackKind, Pattern, RankedArticle,
    ReadingSession, Scope, UserId,
};
