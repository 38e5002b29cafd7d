//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::errors::{ClientError, Result};

/// Domain used when none is configured
pub const DEFAULT_DOMAIN: &str = "translate_zanata_org";

/// File name of the credential store under the user config directory
pub const CREDENTIALS_FILE: &str = "zanata.ini";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Path of the INI credential store
    pub credentials_path: PathBuf,
    /// Server domain looked up in the credential store
    pub domain: String,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            domain: DEFAULT_DOMAIN.to_string(),
            timeout_ms: 30000,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let credentials_path = std::env::var("ZANATA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or(defaults.credentials_path);

        let domain = std::env::var("ZANATA_DOMAIN").unwrap_or(defaults.domain);

        let timeout_ms = match std::env::var("ZANATA_TIMEOUT_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ClientError::config(format!("ZANATA_TIMEOUT_MS is not a number: {}", e))
            })?,
            Err(_) => defaults.timeout_ms,
        };

        let config = Self {
            credentials_path,
            domain,
            timeout_ms,
            user_agent: defaults.user_agent,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ClientError::config(format!("invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Override the domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Override the credential store location
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(ClientError::config("domain is required"));
        }

        if self.timeout_ms == 0 {
            return Err(ClientError::config("timeout_ms must be greater than 0"));
        }

        if !self.credentials_path.exists() {
            warn!(
                "Credential store {} does not exist",
                self.credentials_path.display()
            );
        }

        Ok(())
    }
}

/// Default credential store location
///
/// `$XDG_CONFIG_HOME/zanata.ini`, falling back to `$HOME/.config/zanata.ini`.
pub fn default_credentials_path() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join(CREDENTIALS_FILE);
    }

    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".config")
        .join(CREDENTIALS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let config = ClientConfig::default().with_domain("example_org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_domain() {
        let config = ClientConfig {
            domain: "  ".to_string(),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(ClientError::Config { .. })));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let config = ClientConfig {
            timeout_ms: 0,
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(ClientError::Config { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(
            &path,
            r#"{
                "credentials_path": "/tmp/zanata.ini",
                "domain": "fedora",
                "timeout_ms": 5000,
                "user_agent": "test-agent"
            }"#,
        )
        .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.domain, "fedora");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/zanata.ini"));
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        assert!(default_credentials_path().ends_with(CREDENTIALS_FILE));
    }
}
