//! Runtime server configuration
//!
//! `ServerConfig` is the single source of truth for what the running process
//! uses. It is read from the environment once at startup:
//!
//! - `ORGUNITS_HOST`: bind address (default `127.0.0.1`)
//! - `ORGUNITS_PORT`: listen port (default `3001`)
//! - `ORGUNITS_DB_PATH`: database file (default `~/.orgunits/database/orgunits.db`)
//! - `ORGUNITS_API_TOKENS`: comma-separated API tokens (required)
//!
//! Logging is configured separately through `RUST_LOG`.

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;

pub const ENV_HOST: &str = "ORGUNITS_HOST";
pub const ENV_PORT: &str = "ORGUNITS_PORT";
pub const ENV_DB_PATH: &str = "ORGUNITS_DB_PATH";
pub const ENV_API_TOKENS: &str = "ORGUNITS_API_TOKENS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {var} value '{value}': expected a port number")]
    InvalidPort { var: String, value: String },

    #[error("{0} is empty; at least one API token is required")]
    MissingTokens(String),

    #[error("Failed to resolve home directory for the default database path")]
    NoHomeDirectory,
}

/// Set of accepted API tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiTokens(HashSet<String>);

impl ApiTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list, ignoring blanks and surrounding spaces
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::trim))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Runtime configuration, immutable for the process lifetime
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub api_tokens: ApiTokens,
}

impl ServerConfig {
    /// Build configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup(ENV_PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                var: ENV_PORT.to_string(),
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let db_path = match lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let api_tokens = ApiTokens::parse(&lookup(ENV_API_TOKENS).unwrap_or_default());
        if api_tokens.is_empty() {
            return Err(ConfigError::MissingTokens(ENV_API_TOKENS.to_string()));
        }

        Ok(Self {
            host,
            port,
            db_path,
            api_tokens,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `~/.orgunits/database/orgunits.db`
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home_dir
        .join(".orgunits")
        .join("database")
        .join("orgunits.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_tokens_only() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_API_TOKENS, "secret"),
            (ENV_DB_PATH, "/tmp/orgunits.db"),
        ]))
        .unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.db_path, PathBuf::from("/tmp/orgunits.db"));
        assert_eq!(config.bind_address(), "127.0.0.1:3001");
        assert!(config.api_tokens.contains("secret"));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_HOST, "0.0.0.0"),
            (ENV_PORT, "8080"),
            (ENV_DB_PATH, "/data/org.db"),
            (ENV_API_TOKENS, " a , b,,c "),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api_tokens.len(), 3);
        assert!(config.api_tokens.contains("b"));
        assert!(!config.api_tokens.contains(""));
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            (ENV_PORT, "eighty"),
            (ENV_API_TOKENS, "t"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    #[test]
    fn test_tokens_required() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/tmp/x.db"),
            (ENV_API_TOKENS, " , "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingTokens(ENV_API_TOKENS.to_string()));
    }
}
