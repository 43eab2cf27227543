//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Location
//!
//! Searched in order:
//! 1. `--config <path>` on the command line
//! 2. `$HUBKIT_CONFIG` if set
//! 3. `<config dir>/hubkit/config.toml` (`$XDG_CONFIG_HOME` on Linux)
//!
//! # Validation
//!
//! Values are validated after parsing: `api_base` must be an http(s) URL and
//! `user_agent` must not be blank. Unknown keys are rejected at parse time.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Contents of the configuration file.
///
/// # Example
///
/// ```toml
/// api_base = "https://github.example.com/api/v3"
/// user_agent = "my-tools/1.0"
/// log = "hubkit=debug"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// REST API base URL
    pub api_base: Option<String>,

    /// User-Agent header sent with every request
    pub user_agent: Option<String>,

    /// Default log filter directive (overridden by `RUST_LOG`)
    pub log: Option<String>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.api_base {
            validate_api_base(base)?;
        }

        if let Some(agent) = &self.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "user_agent cannot be empty".to_string(),
                ));
            }
        }

        if let Some(log) = &self.log {
            if log.trim().is_empty() {
                return Err(ConfigError::InvalidValue("log cannot be empty".to_string()));
            }
        }

        Ok(())
    }
}

/// Check that an API base is an absolute http(s) URL.
pub fn validate_api_base(base: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid api_base '{}': {}", base, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue(format!(
            "invalid api_base '{}': scheme must be http or https, not '{}'",
            base, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FileConfig::default();
        assert!(config.api_base.is_none());
        assert!(config.user_agent.is_none());
        assert!(config.log.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_all_keys() {
        let config: FileConfig = toml::from_str(
            r#"
            api_base = "https://ghe.example.com/api/v3"
            user_agent = "tools/2"
            log = "hubkit=trace"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.api_base.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
        assert_eq!(config.user_agent.as_deref(), Some("tools/2"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reject_unknown_fields() {
        let result: Result<FileConfig, _> = toml::from_str("token = \"ghp_secret\"");
        assert!(result.is_err());
    }

    #[test]
    fn non_http_base_rejected() {
        let config = FileConfig {
            api_base: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn unparseable_base_rejected() {
        assert!(validate_api_base("not a url").is_err());
        assert!(validate_api_base("http://localhost:8080").is_ok());
    }

    #[test]
    fn blank_user_agent_rejected() {
        let config = FileConfig {
            user_agent: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
