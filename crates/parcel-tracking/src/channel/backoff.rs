use std::time::Duration;

/// Capped exponential reconnect delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before reconnect `attempt` (1-based): `base * 2^(attempt - 1)`, never above `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(multiplier).min(self.max)
    }
}
