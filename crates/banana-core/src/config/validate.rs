//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gemini.endpoint must not be empty".into(),
            ));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gemini.model must not be empty".into(),
            ));
        }
        if self.gemini.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "gemini.timeout_ms must be > 0".into(),
            ));
        }
        if self.retry.initial_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "retry.initial_delay_ms must be > 0".into(),
            ));
        }
        if self.ui.toast_ttl_ms == 0 {
            return Err(ConfigError::ValidationError(
                "ui.toast_ttl_ms must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Config::default();
        config.gemini.model = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gemini.model"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.gemini.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_zero_initial_delay() {
        let mut config = Config::default();
        config.retry.initial_delay_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("initial_delay_ms"));
    }

    #[test]
    fn test_validate_allows_zero_retries() {
        let mut config = Config::default();
        config.retry.max_retries = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }
}
