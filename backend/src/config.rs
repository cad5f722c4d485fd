//! Configuration
//!
//! Tuning knobs for positions, the rebalance scheduler, transaction retries,
//! storage and logging. Every field has a default, so a TOML file only needs
//! the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ordering: OrderingConfig,
    pub rebalance: RebalanceConfig,
    pub retry: RetryConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Fractional position parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Nominal distance between neighbors after append or rebalance
    pub gap: f64,
    /// Position of the first item of an empty partition
    pub first_position: f64,
    /// A partition whose smallest gap falls below this needs a rebalance
    pub min_gap_threshold: f64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            gap: 1000.0,
            first_position: 0.0,
            min_gap_threshold: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    pub debounce_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            max_wait_ms: 5000,
        }
    }
}

impl RebalanceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt for strict transactions
    pub max_retries: u32,
    pub base_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 10,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: PathBuf,
    /// How long SQLite itself waits on a lock before reporting busy.
    /// Zero hands every conflict straight to the retry layer.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("checklists.db"),
            busy_timeout_ms: 0,
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            ..Default::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            app_name: "Checklists".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> DomainResult<Self> {
        let config: Config =
            toml::from_str(s).map_err(|e| DomainError::InvalidInput(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| {
                DomainError::Internal(format!("Failed to read {}: {}", path.display(), e))
            })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let ordering = &self.ordering;
        if !(ordering.gap.is_finite() && ordering.gap > 0.0) {
            return Err(DomainError::InvalidInput("ordering.gap must be positive".to_string()));
        }
        if !ordering.first_position.is_finite() {
            return Err(DomainError::InvalidInput(
                "ordering.first_position must be finite".to_string(),
            ));
        }
        if !(ordering.min_gap_threshold >= 0.0 && ordering.min_gap_threshold < ordering.gap) {
            return Err(DomainError::InvalidInput(
                "ordering.min_gap_threshold must be in [0, gap)".to_string(),
            ));
        }
        if self.rebalance.max_wait_ms == 0 {
            return Err(DomainError::InvalidInput(
                "rebalance.max_wait_ms must be positive".to_string(),
            ));
        }
        if self.rebalance.debounce_ms > self.rebalance.max_wait_ms {
            return Err(DomainError::InvalidInput(
                "rebalance.debounce_ms must not exceed rebalance.max_wait_ms".to_string(),
            ));
        }
        Ok(())
    }
}
