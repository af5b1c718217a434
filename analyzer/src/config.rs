//! Analyzer configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Access-log slow threshold used when nothing else is configured (seconds)
pub const DEFAULT_HTTPLOG_THRESHOLD: f64 = 1.0;

/// Slow-query threshold used when nothing else is configured (seconds)
pub const DEFAULT_SLOWLOG_THRESHOLD: f64 = 0.5;

/// Wall-clock budget for one slow-log analysis
pub const DEFAULT_SLOWLOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Where an ALP pattern file is looked for when no path is given
pub const DEFAULT_ALP_CONFIG_PATHS: &[&str] = &["data/alp.yml", "alp.yml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Requests at or above this many seconds are reported as slow
    pub httplog_threshold: f64,

    /// Queries at or above this many seconds are reported as slow
    pub slowlog_threshold: f64,

    /// Deadline for the streaming slow-log analysis
    pub slowlog_timeout: Duration,

    /// Explicit ALP pattern file (falls back to `DEFAULT_ALP_CONFIG_PATHS`)
    pub alp_config: Option<PathBuf>,

    /// Max artifacts kept by the in-memory store
    pub store_capacity: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            httplog_threshold: env_parse("PRISM_HTTPLOG_THRESHOLD")
                .unwrap_or(DEFAULT_HTTPLOG_THRESHOLD),
            slowlog_threshold: env_parse("PRISM_SLOWLOG_THRESHOLD")
                .unwrap_or(DEFAULT_SLOWLOG_THRESHOLD),
            slowlog_timeout: env_parse("PRISM_SLOWLOG_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SLOWLOG_TIMEOUT),
            alp_config: std::env::var("PRISM_ALP_CONFIG").ok().map(PathBuf::from),
            store_capacity: env_parse("PRISM_STORE_CAPACITY").unwrap_or(1_000),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AnalyzerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("httplog_threshold", self.httplog_threshold),
            ("slowlog_threshold", self.slowlog_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.slowlog_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "slowlog_timeout must be greater than 0".to_string(),
            ));
        }

        if self.store_capacity == 0 {
            return Err(ConfigError::Invalid(
                "store_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load the ALP pattern file, from the explicit path if one is set
    pub fn load_alp_config(&self) -> Result<AlpConfig, ConfigError> {
        match &self.alp_config {
            Some(path) => AlpConfig::load(path),
            None => AlpConfig::discover(DEFAULT_ALP_CONFIG_PATHS),
        }
    }
}

/// Operator-supplied URI grouping, in the format used by `alp`.
///
/// Only `matching_groups` is read; the other alp keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlpConfig {
    #[serde(default)]
    pub matching_groups: Vec<String>,
}

impl AlpConfig {
    /// Load a pattern file. The format (yaml, toml, json) follows the extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let read_err = |source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        };

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(read_err)?;
        let alp: AlpConfig = settings.try_deserialize().map_err(read_err)?;

        tracing::info!(
            "Loaded {} matching groups from {}",
            alp.matching_groups.len(),
            path.display()
        );
        Ok(alp)
    }

    /// Load the first candidate path that exists
    pub fn discover<P: AsRef<Path>>(candidates: &[P]) -> Result<Self, ConfigError> {
        for candidate in candidates {
            let path = candidate.as_ref();
            if path.is_file() {
                return Self::load(path);
            }
        }
        let tried = candidates
            .iter()
            .map(|p| p.as_ref().display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ConfigError::NotFound(tried))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config() -> AnalyzerConfig {
        AnalyzerConfig {
            httplog_threshold: 1.0,
            slowlog_threshold: 0.5,
            slowlog_timeout: Duration::from_secs(30),
            alp_config: None,
            store_capacity: 10,
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(base_config().validate().is_ok());

        let negative = AnalyzerConfig {
            httplog_threshold: -1.0,
            ..base_config()
        };
        assert!(negative.validate().is_err());

        let nan = AnalyzerConfig {
            slowlog_threshold: f64::NAN,
            ..base_config()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = AnalyzerConfig {
            slowlog_timeout: Duration::ZERO,
            ..base_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_yaml_alp_config() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "sort: sum\nmatching_groups:\n  - ^/api/users/[0-9]+$\n  - ^/static/.*"
        )
        .unwrap();

        let alp = AlpConfig::load(file.path()).unwrap();
        assert_eq!(
            alp.matching_groups,
            vec!["^/api/users/[0-9]+$".to_string(), "^/static/.*".to_string()]
        );
    }

    #[test]
    fn test_load_without_groups_is_empty() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "sort: count").unwrap();
        let alp = AlpConfig::load(file.path()).unwrap();
        assert!(alp.matching_groups.is_empty());
    }

    #[test]
    fn test_discover_missing() {
        let err = AlpConfig::discover(&["/nonexistent/alp.yml"]).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_explicit_path_missing_is_read_error() {
        let config = AnalyzerConfig {
            alp_config: Some(PathBuf::from("/nonexistent/alp.yml")),
            ..base_config()
        };
        assert!(matches!(
            config.load_alp_config(),
            Err(ConfigError::Read { .. })
        ));
    }
}
