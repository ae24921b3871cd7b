//! Core data types for the Pharos feed personalization system
//!
//! This module defines the fundamental data structures shared across the
//! settings and personalization subsystems: typed identifiers, the scope
//! hierarchy, feedback events and learned patterns, and the candidate
//! records flowing through the ranker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from a string
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for users
    UserId
}

uuid_id! {
    /// Unique identifier for subscribed feeds
    FeedId
}

uuid_id! {
    /// Unique identifier for feed categories
    CategoryId
}

uuid_id! {
    /// Unique identifier for articles
    ArticleId
}

/// Settings scope hierarchy: Feed > Category > User > System
///
/// Scopes provide per-feed override granularity while allowing shared
/// defaults. Proximity determines resolution order (Feed is nearest,
/// System is farthest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Override attached to a single feed
    Feed,

    /// Override attached to a category of feeds
    Category,

    /// A user's own defaults
    User,

    /// Hard-coded system defaults (never stored)
    System,
}

impl Scope {
    /// Proximity for resolution ordering; lower is nearer, nearest wins
    pub fn proximity(&self) -> u8 {
        match self {
            Scope::Feed => 0,
            Scope::Category => 1,
            Scope::User => 2,
            Scope::System => 3,
        }
    }

    /// Scopes that accept stored overrides, nearest first
    pub fn writable() -> [Scope; 3] {
        [Scope::Feed, Scope::Category, Scope::User]
    }

    /// Parse from the lowercase form used in storage and URLs
    pub fn parse(s: &str) -> Option<Scope> {
        match s {
            "feed" => Some(Scope::Feed),
            "category" => Some(Scope::Category),
            "user" => Some(Scope::User),
            "system" => Some(Scope::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Feed => write!(f, "feed"),
            Scope::Category => write!(f, "category"),
            Scope::User => write!(f, "user"),
            Scope::System => write!(f, "system"),
        }
    }
}

/// Discrete feedback signal kinds
///
/// Explicit thumbs carry twice the weight of the implicit session signals.
/// Bounce/Completion classification happens upstream of the ingestor (see
/// [`ReadingSession::classify`]); by the time a `FeedbackEvent` exists the
/// kind is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    ThumbsUp,
    ThumbsDown,
    /// Session reached the completion threshold of the estimated reading time
    Completion,
    /// Session ended before the bounce threshold of the estimated reading time
    Bounce,
}

impl FeedbackKind {
    /// Signed per-keyword weight delta applied by the ingestor
    pub fn delta(&self) -> f64 {
        match self {
            FeedbackKind::ThumbsUp => 0.10,
            FeedbackKind::ThumbsDown => -0.10,
            FeedbackKind::Completion => 0.05,
            FeedbackKind::Bounce => -0.05,
        }
    }
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackKind::ThumbsUp => write!(f, "thumbs_up"),
            FeedbackKind::ThumbsDown => write!(f, "thumbs_down"),
            FeedbackKind::Completion => write!(f, "completion"),
            FeedbackKind::Bounce => write!(f, "bounce"),
        }
    }
}

/// One feedback event, consumed by the ingestor to update patterns
///
/// Ephemeral input: retained in the audit log for stat recomputation but
/// never required after aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub user_id: UserId,
    pub article_id: ArticleId,
    /// Topic keywords extracted from the article (external collaborator)
    pub keywords: Vec<String>,
    pub kind: FeedbackKind,
    pub occurred_at: DateTime<Utc>,
}

/// Learned per-user, per-keyword weight reflecting accumulated feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub user_id: UserId,
    pub keyword: String,
    /// Always within [-1, 1]; magnitude, not sign alone, drives ranking
    pub weight: f64,
    pub feedback_count: u32,
    pub updated_at: DateTime<Utc>,
}

/// Ranking input: one candidate article with its base relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub article_id: ArticleId,
    pub published_at: DateTime<Utc>,
    /// Topic keywords extracted from the article (external collaborator)
    pub keywords: Vec<String>,
    /// Semantic similarity or keyword-match score from the search layer
    pub base_score: f64,
}

/// Ranking output: candidate plus final score and its components
///
/// Components are exposed for transparency and debugging, so callers can
/// show why an article ranked where it did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedArticle {
    pub article_id: ArticleId,
    pub published_at: DateTime<Utc>,
    pub final_score: f64,
    pub base_score: f64,
    pub pattern_score: f64,
    pub recency_score: f64,
}

/// Reading-session telemetry supplied by the client
///
/// The bounce/completion determination is made from this record before a
/// [`FeedbackEvent`] is constructed. Clock source and pause/resume handling
/// are the telemetry producer's contract; Pharos only sees the totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSession {
    pub article_id: ArticleId,
    /// Seconds the user actually spent with the article open
    pub time_spent_secs: f64,
    /// Estimated seconds to read the full article
    pub estimated_reading_secs: f64,
}

impl ReadingSession {
    /// Classify a session into an implicit feedback kind.
    ///
    /// Fraction read is `time_spent / estimated_reading_time`. Below
    /// `bounce_threshold` the session counts as a Bounce; at or above
    /// `completion_threshold` it counts as a Completion; in between it
    /// produces no signal. Sessions without a positive reading estimate
    /// produce no signal.
    pub fn classify(
        &self,
        bounce_threshold: f64,
        completion_threshold: f64,
    ) -> Option<FeedbackKind> {
        if self.estimated_reading_secs <= 0.0 || self.time_spent_secs < 0.0 {
            return None;
        }

        let fraction = self.time_spent_secs / self.estimated_reading_secs;
        if fraction < bounce_threshold {
            Some(FeedbackKind::Bounce)
        } else if fraction >= completion_threshold {
            Some(FeedbackKind::Completion)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = FeedId::new();
        let parsed = FeedId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_scope_proximity_ordering() {
        assert!(Scope::Feed.proximity() < Scope::Category.proximity());
        assert!(Scope::Category.proximity() < Scope::User.proximity());
        assert!(Scope::User.proximity() < Scope::System.proximity());
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(Scope::parse("feed"), Some(Scope::Feed));
        assert_eq!(Scope::parse("category"), Some(Scope::Category));
        assert_eq!(Scope::parse("user"), Some(Scope::User));
        assert_eq!(Scope::parse("nope"), None);
    }

    #[test]
    fn test_feedback_deltas() {
        assert!(FeedbackKind::ThumbsUp.delta() > 0.0);
        assert!(FeedbackKind::ThumbsDown.delta() < 0.0);
        assert!(FeedbackKind::Completion.delta() > 0.0);
        assert!(FeedbackKind::Bounce.delta() < 0.0);

        // Explicit thumbs outweigh implicit session signals
        assert!(FeedbackKind::ThumbsUp.delta() > FeedbackKind::Completion.delta());
        assert!(FeedbackKind::ThumbsDown.delta() < FeedbackKind::Bounce.delta());
    }

    #[test]
    fn test_session_classification() {
        let session = |spent: f64, estimated: f64| ReadingSession {
            article_id: ArticleId::new(),
            time_spent_secs: spent,
            estimated_reading_secs: estimated,
        };

        // Left after 10% of a 100s read: bounce
        assert_eq!(
            session(10.0, 100.0).classify(0.25, 0.9),
            Some(FeedbackKind::Bounce)
        );
        // Read 95%: completion
        assert_eq!(
            session(95.0, 100.0).classify(0.25, 0.9),
            Some(FeedbackKind::Completion)
        );
        // Read half: no signal either way
        assert_eq!(session(50.0, 100.0).classify(0.25, 0.9), None);
        // Exactly at the bounce threshold is not a bounce
        assert_eq!(session(25.0, 100.0).classify(0.25, 0.9), None);
        // Missing estimate yields no signal rather than a division artifact
        assert_eq!(session(10.0, 0.0).classify(0.25, 0.9), None);
    }
}
