//! Configuration for the scanner client

use core_config::{env_or_default, ConfigError, FromEnv};

/// API base used when `INVENTORY_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Base URL of the inventory API, including the `/api` prefix
    pub api_url: String,
}

impl ScannerConfig {
    /// Replace the API URL when one was given on the command line.
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        self
    }
}

impl FromEnv for ScannerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: env_or_default("INVENTORY_API_URL", DEFAULT_API_URL),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_url() {
        temp_env::with_var_unset("INVENTORY_API_URL", || {
            let config = ScannerConfig::from_env().unwrap();
            assert_eq!(config.api_url, DEFAULT_API_URL);
        });
    }

    #[test]
    fn test_flag_overrides_env() {
        temp_env::with_var("INVENTORY_API_URL", Some("http://inventory:8080/api"), || {
            let config = ScannerConfig::from_env().unwrap();
            assert_eq!(config.api_url, "http://inventory:8080/api");

            let config = config.with_api_url(Some("http://127.0.0.1:3000/api".into()));
            assert_eq!(config.api_url, "http://127.0.0.1:3000/api");
        });
    }
}
