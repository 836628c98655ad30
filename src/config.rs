//! Ledger configuration.
//!
//! Defaults suit a small deployment. Every value can be overridden through
//! `LEDGER_`-prefixed environment variables:
//!
//! | Variable               | Field                      | Default |
//! |------------------------|----------------------------|---------|
//! | `LEDGER_MAX_RETRIES`   | [`RetryConfig::max_retries`]   | 5       |
//! | `LEDGER_RETRY_BASE_MS` | [`RetryConfig::base_delay_ms`] | 10      |
//! | `LEDGER_RETRY_MAX_MS`  | [`RetryConfig::max_delay_ms`]  | 500     |
//! | `LEDGER_RETRY_JITTER`  | [`RetryConfig::jitter`]        | true    |

use std::time::Duration;

use ::config::{Config, Environment};
use backon::ExponentialBuilder;
use serde::Deserialize;
use thiserror::Error;

/// Prefix shared by every ledger environment variable.
pub const ENV_PREFIX: &str = "LEDGER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("retry base delay {base_ms}ms exceeds max delay {max_ms}ms")]
    DelayRange { base_ms: u64, max_ms: u64 },
}

/// Bounded retry policy for conflicting referral commits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial attempt. 0 means a single attempt.
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every further retry.
    #[serde(rename = "retry_base_ms")]
    pub base_delay_ms: u64,
    /// Cap on any single delay.
    #[serde(rename = "retry_max_ms")]
    pub max_delay_ms: u64,
    /// Add a random share of the current delay to every wait.
    #[serde(rename = "retry_jitter")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 10,
            max_delay_ms: 500,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Policy with no waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Backoff schedule for one submission. The built iterator yields one
    /// delay per allowed retry, then `None`.
    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.base_delay())
            .with_max_delay(self.max_delay())
            .with_max_times(self.max_retries as usize);

        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::DelayRange {
                base_ms: self.base_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }
}

/// Top-level ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    #[serde(flatten)]
    pub retry: RetryConfig,
}

impl LedgerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// Load from an explicit environment source, keeping defaults for
    /// anything it does not set.
    pub fn from_source(source: Environment) -> Result<Self, ConfigError> {
        let config: LedgerConfig = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.retry.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::BackoffBuilder;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(vars))
    }

    #[test]
    fn default_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.base_delay(), Duration::from_millis(10));
        assert_eq!(config.max_delay(), Duration::from_millis(500));
        assert_eq!(config.max_retries, 5);
        assert!(config.jitter);
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            jitter: false,
        };

        let delays: Vec<_> = config.backoff().build().collect();
        assert_eq!(delays, [1, 2, 4, 5, 5].map(Duration::from_secs));
    }

    #[test]
    fn jittered_delays_stay_positive_and_bounded() {
        let config = RetryConfig {
            max_retries: 8,
            base_delay_ms: 100,
            max_delay_ms: 400,
            jitter: true,
        };

        let delays: Vec<_> = config.backoff().build().collect();
        assert_eq!(delays.len(), 8);
        for delay in delays {
            assert!(delay >= Duration::from_millis(100), "delay {delay:?} too short");
            assert!(delay <= Duration::from_millis(800), "delay {delay:?} too long");
        }
    }

    #[test]
    fn retry_budget() {
        let delays: Vec<_> = RetryConfig::immediate(2).backoff().build().collect();
        assert_eq!(delays, [Duration::ZERO, Duration::ZERO]);
        assert_eq!(RetryConfig::immediate(0).backoff().build().next(), None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = LedgerConfig::from_source(env(&[
            ("LEDGER_MAX_RETRIES", "3"),
            ("LEDGER_RETRY_BASE_MS", "20"),
            ("LEDGER_RETRY_MAX_MS", "1000"),
            ("LEDGER_RETRY_JITTER", "false"),
        ]))
        .unwrap();

        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_millis(20));
        assert_eq!(config.retry.max_delay(), Duration::from_secs(1));
        assert!(!config.retry.jitter);
    }

    #[test]
    fn partial_environment_keeps_other_defaults() {
        let config = LedgerConfig::from_source(env(&[("LEDGER_MAX_RETRIES", "9")])).unwrap();
        assert_eq!(
            config.retry,
            RetryConfig {
                max_retries: 9,
                ..RetryConfig::default()
            }
        );
    }

    #[test]
    fn unprefixed_variables_are_ignored() {
        let config = LedgerConfig::from_source(env(&[("MAX_RETRIES", "1")])).unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn unparsable_value_is_an_error() {
        let result = LedgerConfig::from_source(env(&[("LEDGER_MAX_RETRIES", "many")]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn base_delay_above_cap_is_refused() {
        let result = LedgerConfig::from_source(env(&[
            ("LEDGER_RETRY_BASE_MS", "600"),
            ("LEDGER_RETRY_MAX_MS", "100"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::DelayRange {
                base_ms: 600,
                max_ms: 100
            })
        ));
    }

    #[test]
    fn empty_environment_is_default() {
        assert_eq!(
            LedgerConfig::from_source(env(&[])).unwrap(),
            LedgerConfig::default()
        );
    }
}
