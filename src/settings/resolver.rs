//! Hierarchical settings resolution with provenance.
//!
//! Pure precedence logic: given the sparse override records for a feed, its
//! category, and its owner, produce the effective value of every field
//! together with the scope it came from. Strict nearest-scope-wins, no
//! blending; provenance is a first-class output rather than a side effect
//! of merge order.

use crate::error::Result;
use crate::settings::fields::{
    ExtractionMethod, FieldBounds, ScopeOverride, MAX_ARTICLES, MAX_ARTICLE_AGE_DAYS,
    REFRESH_INTERVAL_MINUTES,
};
use crate::types::Scope;
use serde::{Deserialize, Serialize};

/// A resolved value together with the scope that defined it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Scope,
}

/// Effective settings for one feed, with per-field provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub refresh_interval_minutes: Resolved<i64>,
    pub max_articles: Resolved<i64>,
    pub max_article_age_days: Resolved<i64>,
    pub extraction_method: Resolved<ExtractionMethod>,
}

/// The override chain for one feed, nearest scope first.
///
/// `None` entries mean the scope instance has no override record at all
/// (e.g. a feed without a category).
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideChain<'a> {
    pub feed: Option<&'a ScopeOverride>,
    pub category: Option<&'a ScopeOverride>,
    pub user: Option<&'a ScopeOverride>,
}

/// Resolve effective settings from an override chain.
///
/// The first scope (feed > category > user) that defines a field wins
/// outright; a field no scope defines falls back to the hard-coded system
/// default with `source = System`. Stored values are trusted on the happy
/// path, but a value outside its declared bounds fails loudly — that
/// indicates a write-path bug, and substituting a default would hide it.
pub fn resolve(chain: OverrideChain<'_>) -> Result<EffectiveSettings> {
    let scopes = [
        (Scope::Feed, chain.feed),
        (Scope::Category, chain.category),
        (Scope::User, chain.user),
    ];

    Ok(EffectiveSettings {
        refresh_interval_minutes: resolve_int(&REFRESH_INTERVAL_MINUTES, &scopes, |o| {
            o.refresh_interval_minutes
        })?,
        max_articles: resolve_int(&MAX_ARTICLES, &scopes, |o| o.max_articles)?,
        max_article_age_days: resolve_int(&MAX_ARTICLE_AGE_DAYS, &scopes, |o| {
            o.max_article_age_days
        })?,
        extraction_method: resolve_extraction(&scopes),
    })
}

fn resolve_int(
    bounds: &FieldBounds,
    scopes: &[(Scope, Option<&ScopeOverride>)],
    field: impl Fn(&ScopeOverride) -> Option<i64>,
) -> Result<Resolved<i64>> {
    for (scope, overrides) in scopes {
        if let Some(value) = overrides.and_then(&field) {
            bounds.check(value)?;
            return Ok(Resolved {
                value,
                source: *scope,
            });
        }
    }

    Ok(Resolved {
        value: bounds.default,
        source: Scope::System,
    })
}

fn resolve_extraction(scopes: &[(Scope, Option<&ScopeOverride>)]) -> Resolved<ExtractionMethod> {
    for (scope, overrides) in scopes {
        if let Some(value) = overrides.and_then(|o| o.extraction_method) {
            return Resolved {
                value,
                source: *scope,
            };
        }
    }

    Resolved {
        value: ExtractionMethod::DEFAULT,
        source: Scope::System,
    }
}
