//! HTTP API for settings resolution and personalization
//!
//! Provides:
//! - Effective-settings reads with per-field provenance
//! - Scope override writes (validated, atomic per scope)
//! - Feedback ingestion and reset-learning
//! - Candidate ranking with per-article score components

pub mod server;

pub use server::{ApiServer, ApiServerConfig};
