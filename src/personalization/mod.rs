//! Implicit-feedback personalization.
//!
//! Converts passive reading signals (bounce, completion, explicit thumbs)
//! into per-keyword weighted patterns per user, and blends those weights
//! with recency decay to re-rank feed and search results.
//!
//! # Architecture
//!
//! - **PatternStore**: persistent per-(user, keyword) weights with
//!   race-free increments and atomic reset
//! - **FeedbackIngestor**: ingestion policy (normalization, duplicate and
//!   reset-race tolerance)
//! - **ranker**: pure blend of base relevance, pattern weight, and recency
//! - **PersonalizationGate**: cold-start guard below the feedback threshold
//! - **PersonalizationEngine**: the wiring the API consumes

pub mod engine;
pub mod gate;
pub mod ingest;
pub mod patterns;
pub mod ranker;
pub mod schema;

pub use engine::PersonalizationEngine;
pub use gate::PersonalizationGate;
pub use ingest::FeedbackIngestor;
pub use patterns::PatternStore;
pub use ranker::{pattern_contribution, rank, recency_contribution, RankParams, SCORE_EPSILON};
pub use schema::init_personalization_tables;
