//! Configuration for the Pharos service
//!
//! Loads settings from an optional TOML file layered with `PHAROS_*`
//! environment variables. Values that govern the learning loop (activation
//! threshold, bounce/completion thresholds, recency defaults) are validated
//! after deserialization so a bad deployment fails at startup, not at the
//! first ranking call.

use crate::error::{PharosError, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PharosConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub personalization: PersonalizationConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7040,
        }
    }
}

impl ServerConfig {
    /// Parse host/port into a socket address
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| PharosError::Other(format!("invalid server address: {}", e)))
    }
}

/// Database settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "pharos.db".to_string(),
        }
    }
}

/// Personalization engine tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonalizationConfig {
    /// Total feedback events required before pattern-based ranking activates
    pub activation_threshold: u32,
    /// Fraction of estimated reading time below which a session is a bounce
    pub bounce_threshold: f64,
    /// Fraction of estimated reading time at which a session is a completion
    pub completion_threshold: f64,
    /// Recency weight used when a rank request doesn't supply one
    pub default_recency_weight: f64,
    /// Recency half-life in days used when a rank request doesn't supply one
    pub default_recency_decay_days: u32,
}

impl Default for PersonalizationConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 10,
            bounce_threshold: 0.25,
            completion_threshold: 0.9,
            default_recency_weight: 0.3,
            default_recency_decay_days: 7,
        }
    }
}

impl PharosConfig {
    /// Load configuration from an optional TOML file plus environment.
    ///
    /// Environment variables use the `PHAROS_` prefix with `__` as the
    /// section separator, e.g. `PHAROS_SERVER__PORT=8080`.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        let cfg: PharosConfig = builder
            .add_source(config::Environment::with_prefix("PHAROS").separator("__"))
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations that would corrupt the learning loop
    pub fn validate(&self) -> Result<()> {
        let p = &self.personalization;

        if !(0.0..1.0).contains(&p.bounce_threshold) {
            return Err(PharosError::Config(config::ConfigError::Message(format!(
                "bounce_threshold must be a fraction in [0, 1), got {}",
                p.bounce_threshold
            ))));
        }
        if !(0.0..=1.0).contains(&p.completion_threshold)
            || p.completion_threshold <= p.bounce_threshold
        {
            return Err(PharosError::Config(config::ConfigError::Message(format!(
                "completion_threshold must be in ({}, 1], got {}",
                p.bounce_threshold, p.completion_threshold
            ))));
        }
        if !(0.0..=1.0).contains(&p.default_recency_weight) {
            return Err(PharosError::Config(config::ConfigError::Message(format!(
                "default_recency_weight must be within [0, 1], got {}",
                p.default_recency_weight
            ))));
        }
        if p.default_recency_decay_days == 0 {
            return Err(PharosError::Config(config::ConfigError::Message(
                "default_recency_decay_days must be at least 1".to_string(),
            )));
        }

        Ok(())
    }
}
