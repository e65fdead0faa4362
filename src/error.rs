//! Error types for the azuretenants application.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Authentication-related errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth2 authorization failed: {0}")]
    OAuthFailed(String),

    #[error("Invalid authorization code")]
    InvalidAuthCode,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("State validation failed (possible CSRF attack)")]
    StateValidationFailed,

    #[error("OAuth callback timeout")]
    CallbackTimeout,

    #[error("Callback server failed: {0}")]
    CallbackServer(String),

    #[error("Failed to open browser: {0}")]
    BrowserLaunch(String),

    #[error("Tenant has no tenant id")]
    MissingTenantId,
}

/// API-related errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode API response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_keeps_body() {
        let err = AppError::Api(ApiError::Status {
            status: 403,
            body: "{\"error\":\"AuthorizationFailed\"}".into(),
        });
        assert_eq!(
            err.to_string(),
            "API error: HTTP 403: {\"error\":\"AuthorizationFailed\"}"
        );
    }

    #[test]
    fn test_auth_error_display() {
        let err = AppError::from(AuthError::MissingTenantId);
        assert_eq!(err.to_string(), "Authentication error: Tenant has no tenant id");
    }
}
