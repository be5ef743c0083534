//! # Supervisor configuration.
//!
//! Provides [`Config`] settings for the shutdown coordinator.
//!
//! ## Sentinel values
//! - `grace = 0s` → kill immediately after the stop request is issued

use std::time::Duration;

/// Default escalation timeout between the stop request and the forced kill.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// Configuration for the [`Coordinator`](crate::Coordinator).
///
/// ## Field semantics
/// - `grace`: Maximum wait for the activity to exit after a shutdown signal before it is killed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Escalation timeout.
    ///
    /// When a shutdown signal is received:
    /// - the shared `CancellationToken` is cancelled and the activity is asked to stop
    /// - the coordinator waits up to `grace` for the activity to exit
    /// - if it does not, the activity is killed and `RuntimeError::GraceExceeded` is returned
    pub grace: Duration,
}

impl Config {
    /// Builds a configuration with the given grace period.
    pub fn with_grace(grace: Duration) -> Self {
        Self { grace }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 10s`
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grace_is_ten_seconds() {
        assert_eq!(Config::default().grace, Duration::from_secs(10));
        assert_eq!(Config::with_grace(Duration::ZERO).grace, Duration::ZERO);
    }
}
