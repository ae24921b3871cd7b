//! Hierarchical feed settings.
//!
//! Operational settings (refresh cadence, retention, extraction method)
//! resolve through a strict override hierarchy:
//!
//! 1. Feed override (nearest)
//! 2. Category override
//! 3. User default
//! 4. System default (hard-coded, farthest)
//!
//! The first scope that defines a field wins outright; resolution reports
//! the winning scope per field so callers can show where a value came from.
//! Writes validate against declared bounds and are rejected, never clamped.

pub mod catalog;
pub mod fields;
pub mod resolver;
pub mod schema;
pub mod store;

pub use catalog::{Catalog, CategoryRecord, FeedRecord};
pub use fields::{ExtractionMethod, FieldBounds, ScopeOverride};
pub use resolver::{resolve, EffectiveSettings, OverrideChain, Resolved};
pub use store::SettingsStore;
