//! Settings field registry: declared bounds, system defaults, and the
//! sparse per-scope override record.
//!
//! Bounds live here as consts so write-time validation, resolver checks,
//! and error messages all share one source of truth.

use crate::error::{PharosError, Result};
use serde::{Deserialize, Serialize};

/// Declared bounds and system default for an integer settings field
#[derive(Debug, Clone, Copy)]
pub struct FieldBounds {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

impl FieldBounds {
    /// Check a candidate value against the declared bounds.
    ///
    /// Out-of-bounds values are rejected, never clamped: settings govern
    /// resource-consuming background behavior, so silent coercion could
    /// cause excessive load or data loss.
    pub fn check(&self, value: i64) -> Result<()> {
        if value < self.min || value > self.max {
            return Err(PharosError::OutOfBounds {
                field: self.name,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Minutes between feed refreshes
pub const REFRESH_INTERVAL_MINUTES: FieldBounds = FieldBounds {
    name: "refresh_interval_minutes",
    min: 15,
    max: 1440,
    default: 60,
};

/// Maximum retained articles per feed
pub const MAX_ARTICLES: FieldBounds = FieldBounds {
    name: "max_articles",
    min: 50,
    max: 5000,
    default: 500,
};

/// Maximum article age in days before eviction
pub const MAX_ARTICLE_AGE_DAYS: FieldBounds = FieldBounds {
    name: "max_article_age_days",
    min: 1,
    max: 365,
    default: 90,
};

/// Storage/field name for the extraction method setting
pub const EXTRACTION_METHOD_FIELD: &str = "extraction_method";

/// All stored field names, in registry order
pub const FIELD_NAMES: [&str; 4] = [
    REFRESH_INTERVAL_MINUTES.name,
    MAX_ARTICLES.name,
    MAX_ARTICLE_AGE_DAYS.name,
    EXTRACTION_METHOD_FIELD,
];

/// Content-extraction method for a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Use the content embedded in the feed entry
    Rss,
    /// Fetch the page and run readability extraction
    Readability,
    /// Render the page in a headless browser before extraction
    Playwright,
}

impl ExtractionMethod {
    pub const DEFAULT: ExtractionMethod = ExtractionMethod::Rss;

    /// Parse from the lowercase form used in storage
    pub fn parse(s: &str) -> Option<ExtractionMethod> {
        match s {
            "rss" => Some(ExtractionMethod::Rss),
            "readability" => Some(ExtractionMethod::Readability),
            "playwright" => Some(ExtractionMethod::Playwright),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMethod::Rss => write!(f, "rss"),
            ExtractionMethod::Readability => write!(f, "readability"),
            ExtractionMethod::Playwright => write!(f, "playwright"),
        }
    }
}

/// Sparse override record attached to one scope instance.
///
/// Absence of a field means "inherit from the next scope out". An
/// explicitly-set value equal to the system default still counts as
/// defined at this scope, so the UI can distinguish "set back to default"
/// from "never set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_articles: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_article_age_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,
}

impl ScopeOverride {
    /// True when no field is overridden
    pub fn is_empty(&self) -> bool {
        self.refresh_interval_minutes.is_none()
            && self.max_articles.is_none()
            && self.max_article_age_days.is_none()
            && self.extraction_method.is_none()
    }

    /// Validate every present field against its declared bounds
    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.refresh_interval_minutes {
            REFRESH_INTERVAL_MINUTES.check(v)?;
        }
        if let Some(v) = self.max_articles {
            MAX_ARTICLES.check(v)?;
        }
        if let Some(v) = self.max_article_age_days {
            MAX_ARTICLE_AGE_DAYS.check(v)?;
        }
        Ok(())
    }

    /// The stored text value for a field, if overridden here
    pub fn stored_value(&self, field: &str) -> Option<String> {
        match field {
            _ if field == REFRESH_INTERVAL_MINUTES.name => {
                self.refresh_interval_minutes.map(|v| v.to_string())
            }
            _ if field == MAX_ARTICLES.name => self.max_articles.map(|v| v.to_string()),
            _ if field == MAX_ARTICLE_AGE_DAYS.name => {
                self.max_article_age_days.map(|v| v.to_string())
            }
            EXTRACTION_METHOD_FIELD => self.extraction_method.map(|v| v.to_string()),
            _ => None,
        }
    }

    /// Set a field from its stored text value.
    ///
    /// Unparseable values indicate a corrupt row, surfaced as a database
    /// error rather than silently dropped.
    pub fn set_stored_value(&mut self, field: &str, raw: &str) -> Result<()> {
        let parse_int = |raw: &str| {
            raw.parse::<i64>().map_err(|_| {
                PharosError::Database(format!(
                    "corrupt settings row: field '{}' holds non-integer value '{}'",
                    field, raw
                ))
            })
        };

        match field {
            _ if field == REFRESH_INTERVAL_MINUTES.name => {
                self.refresh_interval_minutes = Some(parse_int(raw)?);
            }
            _ if field == MAX_ARTICLES.name => {
                self.max_articles = Some(parse_int(raw)?);
            }
            _ if field == MAX_ARTICLE_AGE_DAYS.name => {
                self.max_article_age_days = Some(parse_int(raw)?);
            }
            EXTRACTION_METHOD_FIELD => {
                self.extraction_method = Some(ExtractionMethod::parse(raw).ok_or_else(|| {
                    PharosError::Database(format!(
                        "corrupt settings row: unknown extraction method '{}'",
                        raw
                    ))
                })?);
            }
            _ => {
                return Err(PharosError::Database(format!(
                    "corrupt settings row: unknown field '{}'",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_check_rejects_without_clamping() {
        assert!(REFRESH_INTERVAL_MINUTES.check(15).is_ok());
        assert!(REFRESH_INTERVAL_MINUTES.check(1440).is_ok());

        let err = REFRESH_INTERVAL_MINUTES.check(5).unwrap_err();
        match err {
            PharosError::OutOfBounds {
                field, min, max, ..
            } => {
                assert_eq!(field, "refresh_interval_minutes");
                assert_eq!(min, 15);
                assert_eq!(max, 1440);
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_override_validation() {
        let ok = ScopeOverride {
            refresh_interval_minutes: Some(30),
            max_articles: Some(100),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = ScopeOverride {
            max_article_age_days: Some(1000),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_default_valued_override_is_still_defined() {
        let ov = ScopeOverride {
            refresh_interval_minutes: Some(REFRESH_INTERVAL_MINUTES.default),
            ..Default::default()
        };
        assert!(!ov.is_empty());
        assert_eq!(
            ov.stored_value(REFRESH_INTERVAL_MINUTES.name),
            Some("60".to_string())
        );
    }

    #[test]
    fn test_stored_value_roundtrip() {
        let ov = ScopeOverride {
            refresh_interval_minutes: Some(30),
            max_articles: Some(250),
            max_article_age_days: Some(14),
            extraction_method: Some(ExtractionMethod::Readability),
        };

        let mut rebuilt = ScopeOverride::default();
        for field in FIELD_NAMES {
            if let Some(raw) = ov.stored_value(field) {
                rebuilt.set_stored_value(field, &raw).unwrap();
            }
        }
        assert_eq!(ov, rebuilt);
    }

    #[test]
    fn test_corrupt_stored_value_is_loud() {
        let mut ov = ScopeOverride::default();
        assert!(ov.set_stored_value("max_articles", "many").is_err());
        assert!(ov.set_stored_value("extraction_method", "telnet").is_err());
        assert!(ov.set_stored_value("no_such_field", "1").is_err());
    }

    #[test]
    fn test_extraction_method_parse() {
        assert_eq!(
            ExtractionMethod::parse("playwright"),
            Some(ExtractionMethod::Playwright)
        );
        assert_eq!(ExtractionMethod::parse("ftp"), None);
    }
}
