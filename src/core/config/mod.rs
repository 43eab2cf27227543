//! core::config
//!
//! Configuration loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file (see [`schema`] for locations)
//! 3. Environment (`HUBKIT_API_BASE`)
//! 4. CLI flags (applied by the caller through [`Config::override_api_base`])
//!
//! The access token is only ever read from `GITHUB_PERSONAL_ACCESS_TOKEN`;
//! it never appears in the config file and is redacted from `Debug` output.
//!
//! # Example
//!
//! ```no_run
//! use hubkit::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("API base: {}", config.api_base());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::forge::github::{DEFAULT_API_BASE, DEFAULT_USER_AGENT};

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "HUBKIT_CONFIG";

/// Environment variable overriding the API base.
pub const API_BASE_ENV: &str = "HUBKIT_API_BASE";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("GITHUB_PERSONAL_ACCESS_TOKEN is not set")]
    MissingToken,
}

/// The process environment variables configuration reads.
///
/// Captured once so loading can be tested without mutating the real
/// environment.
#[derive(Clone, Default)]
pub struct Environment {
    pub token: Option<String>,
    pub config_path: Option<PathBuf>,
    pub api_base: Option<String>,
}

impl Environment {
    /// Capture the relevant variables from the running process.
    pub fn from_process() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            token: non_empty(TOKEN_ENV),
            config_path: non_empty(CONFIG_ENV).map(PathBuf::from),
            api_base: non_empty(API_BASE_ENV),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("config_path", &self.config_path)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Resolved configuration.
#[derive(Clone)]
pub struct Config {
    /// Parsed config file (defaults if none was found)
    pub file: FileConfig,
    token: String,
    api_base: String,
    /// Path the config file was loaded from, if any
    loaded_from: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("file", &self.file)
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("loaded_from", &self.loaded_from)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `config_path` is the `--config` flag, if given.
    ///
    /// # Errors
    ///
    /// - `MissingToken` if `GITHUB_PERSONAL_ACCESS_TOKEN` is absent or empty
    /// - `ReadError` if an explicitly named config file cannot be read
    /// - `ParseError` / `InvalidValue` if the file or environment is malformed
    ///
    /// A missing default config file is not an error (defaults are used).
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(&Environment::from_process(), config_path)
    }

    /// Load configuration from an explicit environment snapshot.
    pub fn load_with(env: &Environment, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = config_path
            .map(Path::to_path_buf)
            .or_else(|| env.config_path.clone());

        let (file, loaded_from) = match explicit {
            Some(path) => (Self::read_file(&path)?, Some(path)),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => (Self::read_file(&path)?, Some(path)),
                None => (FileConfig::default(), None),
            },
        };
        file.validate()?;

        let api_base = match &env.api_base {
            Some(base) => {
                schema::validate_api_base(base)?;
                base.clone()
            }
            None => file
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        };

        let token = env.token.clone().ok_or(ConfigError::MissingToken)?;

        Ok(Config {
            file,
            token,
            api_base,
            loaded_from,
        })
    }

    /// Default config file location: `<config dir>/hubkit/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hubkit").join("config.toml"))
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply a `--api-base` flag.
    pub fn override_api_base(&mut self, base: &str) -> Result<(), ConfigError> {
        schema::validate_api_base(base)?;
        self.api_base = base.to_string();
        Ok(())
    }

    /// The access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The REST API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// The User-Agent header value.
    pub fn user_agent(&self) -> &str {
        self.file.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Log filter directive from the config file, if set.
    pub fn log(&self) -> Option<&str> {
        self.file.log.as_deref()
    }

    /// Path the config file was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_with_token() -> Environment {
        Environment {
            token: Some("ghp_test".to_string()),
            ..Default::default()
        }
    }

    fn write_config(temp: &TempDir, contents: &str) -> PathBuf {
        let path = temp.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_token_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");
        let err = Config::load_with(&Environment::default(), Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
        assert!(err.to_string().contains(TOKEN_ENV));
    }

    #[test]
    fn defaults_without_file_settings() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");
        let config = Config::load_with(&env_with_token(), Some(&path)).unwrap();

        assert_eq!(config.token(), "ghp_test");
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
        assert!(config.log().is_none());
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn file_values_applied() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
            api_base = "https://ghe.example.com/api/v3"
            user_agent = "tools/2"
            log = "hubkit=debug"
            "#,
        );
        let config = Config::load_with(&env_with_token(), Some(&path)).unwrap();

        assert_eq!(config.api_base(), "https://ghe.example.com/api/v3");
        assert_eq!(config.user_agent(), "tools/2");
        assert_eq!(config.log(), Some("hubkit=debug"));
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "api_base = \"https://file.example.com\"");
        let env = Environment {
            api_base: Some("https://env.example.com".to_string()),
            ..env_with_token()
        };

        let mut config = Config::load_with(&env, Some(&path)).unwrap();
        assert_eq!(config.api_base(), "https://env.example.com");

        config.override_api_base("http://127.0.0.1:9999").unwrap();
        assert_eq!(config.api_base(), "http://127.0.0.1:9999");
    }

    #[test]
    fn env_config_path_used_when_no_flag() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "user_agent = \"from-env-path\"");
        let env = Environment {
            config_path: Some(path),
            ..env_with_token()
        };

        let config = Config::load_with(&env, None).unwrap();
        assert_eq!(config.user_agent(), "from-env-path");
    }

    #[test]
    fn explicit_missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let err = Config::load_with(&env_with_token(), Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "token = \"ghp_in_file\"");
        let err = Config::load_with(&env_with_token(), Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_env_base_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");
        let env = Environment {
            api_base: Some("file:///etc".to_string()),
            ..env_with_token()
        };
        assert!(Config::load_with(&env, Some(&path)).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");
        let config = Config::load_with(&env_with_token(), Some(&path)).unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("ghp_test"));
        assert!(debug.contains("<redacted>"));
        assert!(!format!("{:?}", env_with_token()).contains("ghp_test"));
    }
}
