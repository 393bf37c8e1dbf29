use crate::{env_or_default, ConfigError, FromEnv};

/// Allowed browser origins for the HTTP API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Any origin (`*`), the default for the scanner web client.
    #[default]
    Any,
    /// Explicit list of origins.
    Origins(Vec<String>),
}

impl CorsConfig {
    /// Parse a comma-separated origin list; `*` anywhere means any origin.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "cannot be empty".to_string(),
            });
        }

        if origins.iter().any(|o| o == "*") {
            return Ok(Self::Any);
        }

        Ok(Self::Origins(origins))
    }
}

impl FromEnv for CorsConfig {
    /// Reads CORS_ALLOWED_ORIGIN (comma-separated), defaulting to `*`.
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&env_or_default("CORS_ALLOWED_ORIGIN", "*"))
    }
}
