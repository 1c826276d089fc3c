//! Service API-key authentication.
//!
//! Herald's API is a service-to-service surface: callers present the static
//! key from `AppConfig::api_key` in the `X-API-Key` header. When no key is
//! configured, authentication is disabled (dev mode).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use herald_common::error::AppError;

use crate::state::AppState;

/// Authenticated service caller.
///
/// Use as an Axum extractor on protected routes:
/// ```ignore
/// async fn handler(_auth: ServiceAuth) -> impl IntoResponse {
///     // only reached with a valid X-API-Key (or auth disabled)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ServiceAuth;

/// Check a provided key against the configured one.
///
/// No configured key means auth is disabled and every caller passes.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
    match expected {
        None => Ok(()),
        Some(expected) if provided == Some(expected) => Ok(()),
        Some(_) => Err(AppError::Auth(
            "Missing or invalid X-API-Key header".to_string(),
        )),
    }
}

impl FromRequestParts<AppState> for ServiceAuth {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let expected = state.config.api_key.clone();
        let provided = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        async move {
            validate_api_key(expected.as_deref(), provided.as_deref())?;
            Ok(ServiceAuth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_configured_key_allows_everyone() {
        assert!(validate_api_key(None, None).is_ok());
        assert!(validate_api_key(None, Some("anything")).is_ok());
    }

    #[test]
    fn test_matching_key_accepted() {
        assert!(validate_api_key(Some("secret"), Some("secret")).is_ok());
    }

    #[test]
    fn test_missing_or_wrong_key_rejected() {
        assert!(validate_api_key(Some("secret"), None).is_err());
        assert!(validate_api_key(Some("secret"), Some("wrong")).is_err());
        assert!(validate_api_key(Some("secret"), Some("")).is_err());
    }
}
