//! Relevance ranking: base score, learned patterns, recency decay.
//!
//! A pure function of its inputs so it stays independently testable. The
//! blend is
//!
//! ```text
//! final = (1 - w) * (base + pattern) + w * recency
//! ```
//!
//! where `pattern` is the mean pattern weight over the article's keywords
//! (a missing pattern contributes a zero term) and `recency` halves every
//! `recency_decay_days` days of article age. `w = 0` recovers pure
//! base+pattern ranking; `w = 1` makes recency dominate. Both terms are
//! monotone: raising a pattern weight or publishing later never lowers an
//! article's relative rank against an otherwise-equal candidate.

use crate::error::{PharosError, Result};
use crate::types::{Candidate, Pattern, RankedArticle};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::warn;

/// Two final scores within this distance are a tie, broken by recency
pub const SCORE_EPSILON: f64 = 1e-9;

/// Ranking parameters, validated at the call boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankParams {
    /// Blend weight of the recency term, within [0, 1]
    pub recency_weight: f64,
    /// Days after which the recency term halves; at least 1
    pub recency_decay_days: u32,
}

impl RankParams {
    pub fn validate(&self) -> Result<()> {
        if !self.recency_weight.is_finite() || !(0.0..=1.0).contains(&self.recency_weight) {
            return Err(PharosError::InvalidRecencyParameters(format!(
                "recency_weight must be within [0, 1], got {}",
                self.recency_weight
            )));
        }
        if self.recency_decay_days == 0 {
            return Err(PharosError::InvalidRecencyParameters(
                "recency_decay_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rank candidates by blended relevance, best first.
///
/// Pattern rows outside [-1, 1] or non-finite are skipped (their keyword
/// contributes zero) — a malformed row degrades that article's score
/// slightly rather than failing the whole call.
pub fn rank(
    candidates: &[Candidate],
    patterns: &HashMap<String, Pattern>,
    params: &RankParams,
    now: DateTime<Utc>,
) -> Result<Vec<RankedArticle>> {
    params.validate()?;

    let mut ranked: Vec<RankedArticle> = candidates
        .iter()
        .map(|candidate| {
            let pattern_score = pattern_contribution(&candidate.keywords, patterns);
            let recency_score =
                recency_contribution(candidate.published_at, now, params.recency_decay_days);
            let final_score = (1.0 - params.recency_weight)
                * (candidate.base_score + pattern_score)
                + params.recency_weight * recency_score;

            RankedArticle {
                article_id: candidate.article_id,
                published_at: candidate.published_at,
                final_score,
                base_score: candidate.base_score,
                pattern_score,
                recency_score,
            }
        })
        .collect();

    ranked.sort_by(compare_ranked);
    Ok(ranked)
}

/// Mean pattern weight over the article's keywords.
///
/// Averaging (rather than summing) bounds the contribution to [-1, 1]
/// regardless of keyword count, so a single dominant pattern cannot
/// overwhelm base relevance, while staying monotone in every individual
/// pattern weight.
pub fn pattern_contribution(keywords: &[String], patterns: &HashMap<String, Pattern>) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }

    let sum: f64 = keywords
        .iter()
        .map(|keyword| match patterns.get(keyword) {
            Some(pattern)
                if pattern.weight.is_finite() && (-1.0..=1.0).contains(&pattern.weight) =>
            {
                pattern.weight
            }
            Some(pattern) => {
                warn!(
                    "Ignoring malformed pattern weight {} for keyword '{}'",
                    pattern.weight, keyword
                );
                0.0
            }
            None => 0.0,
        })
        .sum();

    sum / keywords.len() as f64
}

/// Exponential decay of article age: 1.0 when brand new, 0.5 after one
/// half-life of `decay_days`. Future-dated articles count as age zero.
pub fn recency_contribution(
    published_at: DateTime<Utc>,
    now: DateTime<Utc>,
    decay_days: u32,
) -> f64 {
    let age_days = (now - published_at).num_milliseconds().max(0) as f64 / 86_400_000.0;
    0.5_f64.powf(age_days / decay_days as f64)
}

fn compare_ranked(a: &RankedArticle, b: &RankedArticle) -> Ordering {
    if (a.final_score - b.final_score).abs() <= SCORE_EPSILON {
        // Equal within tolerance: more recent first
        b.published_at.cmp(&a.published_at)
    } else {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    }
}
