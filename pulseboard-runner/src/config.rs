//! Serializable dashboard configuration.

use pulseboard_core::domain::RefreshInterval;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tunables for the dashboard engine, loadable from TOML.
///
/// Every field has a default so a partial config file works:
///
/// ```toml
/// baseline_reach = 0.12
/// page_size = 25
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Fraction of followers expected to see a post (virality baseline).
    pub baseline_reach: f64,
    /// Rows per page in ranked tables.
    pub page_size: usize,
    /// Cap on the recently-used custom ranges list.
    pub recent_ranges_cap: usize,
    /// Entities consumed per cooperative aggregation step.
    pub chunk_size: usize,
    /// Bound on cached snapshots before the oldest is evicted.
    pub cache_capacity: usize,
    /// Auto-refresh cadence applied to a fresh FilterState.
    pub default_refresh: RefreshInterval,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            baseline_reach: 0.10,
            page_size: 10,
            recent_ranges_cap: 8,
            chunk_size: 256,
            cache_capacity: 32,
            default_refresh: RefreshInterval::Off,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: DashboardConfig =
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.baseline_reach > 0.0 && self.baseline_reach <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "baseline_reach must be in (0, 1], got {}",
                self.baseline_reach
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be >= 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(DashboardConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: DashboardConfig = toml::from_str("baseline_reach = 0.25\n").unwrap();
        assert_eq!(config.baseline_reach, 0.25);
        assert_eq!(config.page_size, DashboardConfig::default().page_size);
    }

    #[test]
    fn load_round_trips_through_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size = 25\n\n[default_refresh]\ntype = \"every\"\nsecs = 60").unwrap();
        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.default_refresh, RefreshInterval::ONE_MINUTE);
    }

    #[test]
    fn out_of_range_baseline_is_rejected() {
        let config: DashboardConfig = toml::from_str("baseline_reach = 1.5\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
