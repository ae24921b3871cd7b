//! Feedback ingestion policy.
//!
//! Thin layer between the API and the pattern store: normalizes the
//! keyword set, tolerates duplicate delivery (at-least-once — one duplicate
//! only nudges weights by one bounded delta), and downgrades reset races to
//! a dropped event. A lost feedback event is a missed learning opportunity,
//! not a correctness breach.

use crate::error::{PharosError, Result};
use crate::personalization::patterns::PatternStore;
use crate::types::FeedbackEvent;
use tracing::{debug, warn};

/// Feedback ingestor
#[derive(Clone)]
pub struct FeedbackIngestor {
    store: PatternStore,
}

impl FeedbackIngestor {
    pub fn new(store: PatternStore) -> Self {
        Self { store }
    }

    /// Ingest one feedback event.
    ///
    /// An event with no usable keywords is a no-op, not an error — there is
    /// nothing to learn from it. A write that raced a reset-learning wipe
    /// is dropped silently after logging.
    pub async fn ingest(&self, event: &FeedbackEvent) -> Result<()> {
        let keywords = normalize_keywords(&event.keywords);
        if keywords.is_empty() {
            debug!(
                "Ignoring {} event for article {} with no usable keywords",
                event.kind, event.article_id
            );
            return Ok(());
        }

        match self.store.apply_feedback(event, &keywords).await {
            Ok(()) => Ok(()),
            Err(PharosError::ConcurrentResetRace(reason)) => {
                warn!("Dropping feedback event: {}", reason);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Lowercase, trim, drop empties, and dedup while preserving order.
///
/// The extractor upstream is not guaranteed to emit a canonical set, and a
/// duplicated keyword must not double-apply an event's delta.
fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}
