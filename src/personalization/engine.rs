//! Personalization engine: the wiring the API consumes.
//!
//! Owns the pattern store, the ingestion policy, and the activation gate.
//! Ranking fetches the user's accumulated feedback volume, consults the
//! gate, and runs the pure ranker with either the real pattern map or an
//! empty one — a cold user's ranking is mathematically identical to the
//! zero-pattern case.

use crate::config::PersonalizationConfig;
use crate::error::Result;
use crate::personalization::gate::PersonalizationGate;
use crate::personalization::ingest::FeedbackIngestor;
use crate::personalization::patterns::PatternStore;
use crate::personalization::ranker::{self, RankParams};
use crate::types::{Candidate, FeedbackEvent, Pattern, RankedArticle, UserId};
use chrono::{DateTime, Utc};
use libsql::Database;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Personalization engine
#[derive(Clone)]
pub struct PersonalizationEngine {
    patterns: PatternStore,
    ingestor: FeedbackIngestor,
    gate: PersonalizationGate,
}

impl PersonalizationEngine {
    pub fn new(db: Arc<Database>, config: &PersonalizationConfig) -> Self {
        let patterns = PatternStore::new(db);
        Self {
            ingestor: FeedbackIngestor::new(patterns.clone()),
            gate: PersonalizationGate::new(config.activation_threshold),
            patterns,
        }
    }

    pub fn pattern_store(&self) -> &PatternStore {
        &self.patterns
    }

    pub fn gate(&self) -> &PersonalizationGate {
        &self.gate
    }

    /// Ingest one feedback event
    pub async fn ingest(&self, event: &FeedbackEvent) -> Result<()> {
        self.ingestor.ingest(event).await
    }

    /// Delete all learned patterns for a user; returns rows deleted
    pub async fn reset_learning(&self, user_id: UserId) -> Result<u64> {
        self.patterns.reset(user_id).await
    }

    /// A user's learned patterns, strongest first
    pub async fn patterns(&self, user_id: UserId) -> Result<Vec<Pattern>> {
        self.patterns.all_patterns(user_id).await
    }

    /// Whether pattern-based ranking is currently active for a user
    pub async fn is_active(&self, user_id: UserId) -> Result<bool> {
        let total = self.patterns.total_feedback(user_id).await?;
        Ok(self.gate.is_active(total))
    }

    /// Rank candidates for a user.
    ///
    /// Parameter validation happens before any storage access so invalid
    /// requests fail fast. Below the activation threshold the pattern map
    /// is left empty and ranking degrades to base relevance plus recency.
    pub async fn rank_for_user(
        &self,
        user_id: UserId,
        candidates: &[Candidate],
        params: &RankParams,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedArticle>> {
        params.validate()?;

        let total = self.patterns.total_feedback(user_id).await?;
        let patterns: HashMap<String, Pattern> = if self.gate.is_active(total) {
            let mut keywords: Vec<String> = candidates
                .iter()
                .flat_map(|c| c.keywords.iter().cloned())
                .collect();
            keywords.sort();
            keywords.dedup();
            self.patterns.patterns_for(user_id, &keywords).await?
        } else {
            debug!(
                "Personalization cold for user {} ({}/{} feedback events); ranking without patterns",
                user_id,
                total,
                self.gate.activation_threshold()
            );
            HashMap::new()
        };

        ranker::rank(candidates, &patterns, params, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::test_db;
    use crate::types::{ArticleId, FeedbackKind};
    use chrono::Duration;

    async fn test_engine(threshold: u32) -> PersonalizationEngine {
        let db = test_db().await;
        let config = PersonalizationConfig {
            activation_threshold: threshold,
            ..Default::default()
        };
        PersonalizationEngine::new(db, &config)
    }

    fn thumbs_up(user: UserId, keyword: &str) -> FeedbackEvent {
        FeedbackEvent {
            user_id: user,
            article_id: ArticleId::new(),
            keywords: vec![keyword.to_string()],
            kind: FeedbackKind::ThumbsUp,
            occurred_at: Utc::now(),
        }
    }

    fn candidates(now: DateTime<Utc>) -> Vec<Candidate> {
        vec![
            Candidate {
                article_id: ArticleId::new(),
                published_at: now - Duration::days(1),
                keywords: vec!["rust".to_string()],
                base_score: 0.5,
            },
            Candidate {
                article_id: ArticleId::new(),
                published_at: now - Duration::days(1),
                keywords: vec!["cooking".to_string()],
                base_score: 0.5,
            },
        ]
    }

    #[tokio::test]
    async fn test_below_threshold_identical_to_zero_patterns() {
        let engine = test_engine(10).await;
        let user = UserId::new();
        let now = Utc::now();

        // threshold - 1 events: gate stays cold
        for _ in 0..9 {
            engine.ingest(&thumbs_up(user, "rust")).await.unwrap();
        }
        assert!(!engine.is_active(user).await.unwrap());

        let params = RankParams {
            recency_weight: 0.0,
            recency_decay_days: 7,
        };
        let cold = engine
            .rank_for_user(user, &candidates(now), &params, now)
            .await
            .unwrap();
        let fresh_user = engine
            .rank_for_user(UserId::new(), &candidates(now), &params, now)
            .await
            .unwrap();

        for (a, b) in cold.iter().zip(fresh_user.iter()) {
            assert_eq!(a.pattern_score, 0.0);
            assert!((a.final_score - b.final_score).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn test_at_threshold_patterns_activate() {
        let engine = test_engine(10).await;
        let user = UserId::new();
        let now = Utc::now();

        for _ in 0..10 {
            engine.ingest(&thumbs_up(user, "rust")).await.unwrap();
        }
        assert!(engine.is_active(user).await.unwrap());

        let params = RankParams {
            recency_weight: 0.3,
            recency_decay_days: 7,
        };
        let ranked = engine
            .rank_for_user(user, &candidates(now), &params, now)
            .await
            .unwrap();

        // rust-tagged candidate now outranks the otherwise-equal one
        assert!(ranked[0].pattern_score > 0.0);
        assert_eq!(ranked[1].pattern_score, 0.0);
    }

    #[tokio::test]
    async fn test_reset_returns_to_cold_and_zero_contribution() {
        let engine = test_engine(5).await;
        let user = UserId::new();
        let now = Utc::now();

        for _ in 0..6 {
            engine.ingest(&thumbs_up(user, "rust")).await.unwrap();
        }
        assert!(engine.is_active(user).await.unwrap());

        engine.reset_learning(user).await.unwrap();
        assert!(!engine.is_active(user).await.unwrap());

        let params = RankParams {
            recency_weight: 0.0,
            recency_decay_days: 7,
        };
        let ranked = engine
            .rank_for_user(user, &candidates(now), &params, now)
            .await
            .unwrap();
        assert!(ranked.iter().all(|a| a.pattern_score == 0.0));
    }

    #[tokio::test]
    async fn test_invalid_params_rejected_before_storage() {
        let engine = test_engine(10).await;
        let params = RankParams {
            recency_weight: 2.0,
            recency_decay_days: 7,
        };
        let result = engine
            .rank_for_user(UserId::new(), &[], &params, Utc::now())
            .await;
        assert!(result.is_err());
    }
}
