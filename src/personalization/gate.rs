//! Cold-start guard for pattern-based ranking.
//!
//! Below the activation threshold the engine declines to personalize:
//! insufficient signal produces noisy, potentially adversarial-feeling
//! rankings, so callers fall back to base relevance plus recency. The
//! transition is one-directional under normal operation; reset-learning
//! forces a user back to cold.

/// Personalization activation gate
#[derive(Debug, Clone, Copy)]
pub struct PersonalizationGate {
    activation_threshold: u32,
}

impl PersonalizationGate {
    /// Default total-feedback threshold before patterns apply
    pub const DEFAULT_THRESHOLD: u32 = 10;

    pub fn new(activation_threshold: u32) -> Self {
        Self {
            activation_threshold,
        }
    }

    /// Whether pattern-based ranking is active for this feedback volume
    pub fn is_active(&self, total_feedback_count: u64) -> bool {
        total_feedback_count >= u64::from(self.activation_threshold)
    }

    pub fn activation_threshold(&self) -> u32 {
        self.activation_threshold
    }
}

impl Default for PersonalizationGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}
