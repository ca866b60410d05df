//! Retry and paging policies.

use std::time::Duration;

use dss_config::ArcgisConfig;

/// Exponential backoff with jitter.
///
/// The delay before attempt `n + 1` is `base * 2^(n-1)` plus up to `base / 2`
/// of jitter, raised to any `Retry-After` the service sent, then capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base: Duration::from_millis(600),
            cap: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &ArcgisConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: config.backoff_base(),
            cap: config.backoff_cap(),
        }
    }

    /// No waiting between attempts.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base: Duration::ZERO,
            cap: Duration::ZERO,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self.base.saturating_mul(1 << exp);
        let jitter = self.base.mul_f64(jitter_fraction() / 2.0);
        let delay = backoff.saturating_add(jitter);
        let delay = retry_after.map_or(delay, |ra| delay.max(ra));
        delay.min(self.cap)
    }
}

/// Uniform in `[0, 1)`. Falls back to zero if the OS source is unavailable.
fn jitter_fraction() -> f64 {
    let mut bytes = [0u8; 8];
    if getrandom::fill(&mut bytes).is_err() {
        return 0.0;
    }
    // 53 random mantissa bits
    #[allow(clippy::cast_precision_loss)]
    let fraction = (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64;
    fraction
}

/// Page sizing and the page cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingPolicy {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for PagingPolicy {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_pages: 50,
        }
    }
}

impl PagingPolicy {
    #[must_use]
    pub fn from_config(config: &ArcgisConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
        }
    }
}
