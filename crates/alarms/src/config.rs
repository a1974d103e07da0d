//! Configuration for the alarm scheduler.

use std::path::Path;

use reveille_core::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`SchedulerConfig::min_repeat_interval_ms`].
pub const ENV_MIN_REPEAT_INTERVAL_MS: &str = "REVEILLE_MIN_REPEAT_INTERVAL_MS";

/// Environment variable overriding [`SchedulerConfig::skew_warn_threshold_ms`].
pub const ENV_SKEW_WARN_THRESHOLD_MS: &str = "REVEILLE_SKEW_WARN_THRESHOLD_MS";

/// Configuration for the [`AlarmScheduler`](crate::AlarmScheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Smallest accepted repeat interval.
    #[serde(default = "default_min_repeat_interval_ms")]
    pub min_repeat_interval_ms: i64,

    /// Log a warning when caller and host clocks differ by more than this.
    #[serde(default)]
    pub skew_warn_threshold_ms: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_repeat_interval_ms: default_min_repeat_interval_ms(),
            skew_warn_threshold_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Set the minimum repeat interval.
    #[must_use]
    pub const fn min_repeat_interval_ms(mut self, interval_ms: i64) -> Self {
        self.min_repeat_interval_ms = interval_ms;
        self
    }

    /// Set the skew warning threshold.
    #[must_use]
    pub const fn skew_warn_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.skew_warn_threshold_ms = Some(threshold_ms);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Unparsable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(interval) = env_value::<i64>(ENV_MIN_REPEAT_INTERVAL_MS) {
            config.min_repeat_interval_ms = interval;
        }

        if let Some(threshold) = env_value::<u64>(ENV_SKEW_WARN_THRESHOLD_MS) {
            config.skew_warn_threshold_ms = Some(threshold);
        }

        config
    }

    /// Load configuration from a file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)
                .map_err(|e| Error::config_parse_failed(format!("Failed to parse config: {e}")))?
        } else {
            toml::from_str(&content)
                .map_err(|e| Error::config_parse_failed(format!("Failed to parse config: {e}")))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParseFailed`] if the minimum repeat interval is
    /// not positive.
    pub fn validate(&self) -> Result<()> {
        if self.min_repeat_interval_ms < 1 {
            return Err(Error::config_parse_failed(format!(
                "min_repeat_interval_ms must be at least 1, got {}",
                self.min_repeat_interval_ms
            )));
        }
        Ok(())
    }
}

const fn default_min_repeat_interval_ms() -> i64 {
    1
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    raw.trim()
        .parse::<T>()
        .map_err(|e| Error::config_parse_failed(format!("{key}={raw}: {e}")))
        .into_option_logged()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.min_repeat_interval_ms, 1);
        assert_eq!(config.skew_warn_threshold_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = SchedulerConfig::default()
            .min_repeat_interval_ms(60_000)
            .skew_warn_threshold_ms(1_000);
        assert_eq!(config.min_repeat_interval_ms, 60_000);
        assert_eq!(config.skew_warn_threshold_ms, Some(1_000));
    }

    #[test]
    fn test_config_validate_rejects_zero_interval() {
        let config = SchedulerConfig::default().min_repeat_interval_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "min_repeat_interval_ms = 60000")?;
        writeln!(file, "skew_warn_threshold_ms = 250")?;

        let config = SchedulerConfig::from_file(file.path())?;
        assert_eq!(config.min_repeat_interval_ms, 60_000);
        assert_eq!(config.skew_warn_threshold_ms, Some(250));
        Ok(())
    }

    #[test]
    fn test_config_from_json_file_uses_defaults() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        writeln!(file, "{{\"skew_warn_threshold_ms\": 10}}")?;

        let config = SchedulerConfig::from_file(file.path())?;
        assert_eq!(config.min_repeat_interval_ms, 1);
        assert_eq!(config.skew_warn_threshold_ms, Some(10));
        Ok(())
    }

    #[test]
    fn test_config_from_file_rejects_invalid() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "min_repeat_interval_ms = -1")?;

        let result = SchedulerConfig::from_file(file.path());
        assert!(matches!(result, Err(Error::ConfigParseFailed { .. })));
        Ok(())
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = SchedulerConfig::from_file(Path::new("/nonexistent/reveille.toml"));
        assert!(matches!(result, Err(Error::FileReadFailed { .. })));
    }
}
