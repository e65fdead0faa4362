//! Azure AD authentication module.
//!
//! Provides the interactive browser credential (OAuth2 with PKCE and a
//! loopback callback server) behind the [`TokenSource`] seam.

pub mod callback_server;
pub mod credential;
pub mod oauth;
pub mod token;

use async_trait::async_trait;

use crate::error::AuthError;

pub use credential::InteractiveBrowserProvider;
pub use token::AccessToken;

/// Something that can issue bearer tokens for a set of scopes.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken, AuthError>;
}

/// Creates token sources bound to a tenant.
pub trait CredentialProvider: Send + Sync {
    /// A credential for `tenant`, or for the configured home tenant when `None`.
    fn credential(&self, tenant: Option<&str>) -> Result<Box<dyn TokenSource>, AuthError>;
}
