//! Trial configuration records

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Target endpoint the traffic generator connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Server host or address
    pub host: String,
    /// Server port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint descriptor.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Configuration of one trial: which scheduling policy to measure, for how
/// long, and against which endpoint.
///
/// Immutable for the life of the trial. The policy itself is an external,
/// named kernel configuration value; this crate never implements schedulers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialConfig {
    scheduler: String,
    duration: Duration,
    endpoint: Endpoint,
}

impl TrialConfig {
    /// Create a trial configuration.
    #[must_use]
    pub fn new(scheduler: impl Into<String>, duration: Duration, endpoint: Endpoint) -> Self {
        Self {
            scheduler: scheduler.into(),
            duration,
            endpoint,
        }
    }

    /// Name of the scheduling policy under test.
    #[must_use]
    pub fn scheduler(&self) -> &str {
        &self.scheduler
    }

    /// Wall-clock duration of the trial's active phase.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Target endpoint descriptor.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let ep = Endpoint::new("10.0.0.2", 5001);
        assert_eq!(ep.to_string(), "10.0.0.2:5001");
    }

    #[test]
    fn test_trial_config_accessors() {
        let config = TrialConfig::new(
            "blest",
            Duration::from_secs(10),
            Endpoint::new("10.0.0.2", 5001),
        );
        assert_eq!(config.scheduler(), "blest");
        assert_eq!(config.duration(), Duration::from_secs(10));
        assert_eq!(config.endpoint().port, 5001);
    }
}
