use axum::http::{HeaderValue, Method, header};
use core_config::cors::CorsConfig;
use std::io;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Creates a CORS layer from the configured origin policy.
///
/// The layer allows:
/// - Methods used by the API (GET, POST, PUT, DELETE, PATCH, OPTIONS)
/// - Content-Type and Accept headers
/// - 1 hour max age
///
/// No credentials are allowed; the API is unauthenticated and browsers
/// reject credentials combined with a wildcard origin.
///
/// # Errors
/// Returns `InvalidInput` if an explicit origin is not a valid header value.
pub fn create_cors_layer(config: &CorsConfig) -> io::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    match config {
        CorsConfig::Any => Ok(layer.allow_origin(Any)),
        CorsConfig::Origins(origins) => {
            let allowed = origins
                .iter()
                .map(|origin| origin.parse::<HeaderValue>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Invalid CORS_ALLOWED_ORIGIN value: {e}"),
                    )
                })?;
            Ok(layer.allow_origin(allowed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_origin_builds() {
        assert!(create_cors_layer(&CorsConfig::Any).is_ok());
    }

    #[test]
    fn test_origin_list_builds() {
        let config = CorsConfig::Origins(vec!["http://localhost:5173".to_string()]);
        assert!(create_cors_layer(&config).is_ok());
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let config = CorsConfig::Origins(vec!["http://bad\norigin".to_string()]);
        let err = create_cors_layer(&config).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
