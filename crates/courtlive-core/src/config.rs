// ── Engine configuration ──
//
// Runtime knobs handed in by the embedding application. The engine never
// reads configuration files itself.

use std::time::Duration;

/// Extra delay applied between polls after consecutive failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Keep the regular cadence regardless of failures.
    #[default]
    None,
    /// Wait `base * 2^(failures - 1)`, capped at `max`, before resuming.
    Exponential { base: Duration, max: Duration },
}

impl BackoffPolicy {
    /// Additional delay after `failures` consecutive failed ticks.
    pub fn delay(&self, failures: u32) -> Option<Duration> {
        match *self {
            Self::None => None,
            Self::Exponential { .. } if failures == 0 => None,
            Self::Exponential { base, max } => {
                let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
                Some(base.saturating_mul(factor).min(max))
            }
        }
    }
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cadence of the display-scoped court sync task.
    pub sync_interval: Duration,
    /// Quiet period that coalesces bursts of registry edits into one save.
    pub persist_debounce: Duration,
    /// Court entries not refreshed within this window are dropped on sync.
    /// `None` keeps entries until display scoping evicts them.
    pub court_max_age: Option<Duration>,
    /// Poll backoff after failures.
    pub backoff: BackoffPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_millis(2000),
            persist_debounce: Duration::from_millis(500),
            court_max_age: Some(Duration::from_secs(300)),
            backoff: BackoffPolicy::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_backoff_by_default() {
        assert_eq!(EngineConfig::default().backoff.delay(5), None);
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let policy = BackoffPolicy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(10),
        };
        assert_eq!(policy.delay(0), None);
        assert_eq!(policy.delay(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay(8), Some(Duration::from_secs(10)));
        assert_eq!(policy.delay(64), Some(Duration::from_secs(10)));
    }
}
