//! Interactive browser credential.
//!
//! Each call to [`TokenSource::get_token`] runs one full authorization-code
//! sign-in: the system browser is opened on the Azure AD authorize page and
//! the call blocks until the redirect arrives on the local callback server.

use async_trait::async_trait;
use std::io;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::callback_server::{CallbackResult, CallbackServer};
use super::oauth::{parse_callback_url, OAuth2Client, PkceChallenge};
use super::token::AccessToken;
use super::{CredentialProvider, TokenSource};
use crate::config::Config;
use crate::error::AuthError;

/// Opens the authorize URL for the user.
pub type BrowserOpener = fn(&str) -> io::Result<()>;

fn open_system_browser(url: &str) -> io::Result<()> {
    open::that(url)
}

/// Credential that signs the user in through the system browser.
pub struct InteractiveBrowserCredential {
    oauth_client: OAuth2Client,
    redirect: Url,
    login_timeout: Option<Duration>,
    open_browser: BrowserOpener,
}

impl InteractiveBrowserCredential {
    /// Create a credential bound to `tenant`.
    pub fn new(config: &Config, tenant: &str) -> Result<Self, AuthError> {
        if tenant.is_empty() {
            return Err(AuthError::MissingTenantId);
        }

        let redirect = config
            .redirect_url()
            .map_err(|e| AuthError::CallbackServer(e.to_string()))?;

        Ok(Self {
            oauth_client: OAuth2Client::new(config, tenant)?,
            redirect,
            login_timeout: config.login_timeout(),
            open_browser: open_system_browser,
        })
    }

    /// Wait on a blocking thread for the browser redirect.
    async fn await_callback(
        &self,
        server: CallbackServer,
        auth_url: &Url,
    ) -> Result<String, AuthError> {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let timeout = self.login_timeout;
        let waiter =
            tokio::task::spawn_blocking(move || server.wait_for_callback(cancel_rx, timeout));

        if let Err(e) = (self.open_browser)(auth_url.as_str()) {
            warn!("Failed to open browser: {}", e);
            let _ = cancel_tx.send(());
            let _ = waiter.await;
            return Err(AuthError::BrowserLaunch(e.to_string()));
        }

        let result = waiter
            .await
            .map_err(|e| AuthError::CallbackServer(e.to_string()))?;

        match result {
            CallbackResult::Success(url) => Ok(url),
            CallbackResult::TimedOut => Err(AuthError::CallbackTimeout),
            CallbackResult::Cancelled => {
                Err(AuthError::OAuthFailed("Sign-in was cancelled".to_string()))
            }
            CallbackResult::Error(e) => Err(AuthError::CallbackServer(e)),
        }
    }
}

#[async_trait]
impl TokenSource for InteractiveBrowserCredential {
    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken, AuthError> {
        let tenant = self.oauth_client.tenant();
        info!("Signing in to tenant {} in the browser", tenant);

        let server = CallbackServer::bind(&self.redirect)?;
        debug!("Waiting for sign-in redirect on port {}", server.port());

        // Port 0 in the configured redirect resolves to whatever was bound
        let mut redirect = self.redirect.clone();
        redirect
            .set_port(Some(server.port()))
            .map_err(|_| AuthError::CallbackServer("Redirect URL cannot carry a port".into()))?;

        let pkce = PkceChallenge::new();
        let (auth_url, expected_state) =
            self.oauth_client
                .generate_auth_url(&pkce, redirect.as_str(), scopes)?;

        let callback_url = self.await_callback(server, &auth_url).await?;

        let (code, state) = parse_callback_url(&callback_url)?;
        if state != expected_state {
            return Err(AuthError::StateValidationFailed);
        }

        let response = self
            .oauth_client
            .exchange_code(&code, &pkce.verifier, redirect.as_str(), scopes)
            .await?;
        debug!(
            "Received {} token for '{}' in tenant {}",
            response.token_type, response.scope, tenant
        );

        let token = AccessToken::from_response(&response);
        info!("Signed in to tenant {}, token expires at {}", tenant, token.expires_on());
        Ok(token)
    }
}

/// Hands out [`InteractiveBrowserCredential`]s from the application config.
pub struct InteractiveBrowserProvider {
    config: Config,
}

impl InteractiveBrowserProvider {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl CredentialProvider for InteractiveBrowserProvider {
    fn credential(&self, tenant: Option<&str>) -> Result<Box<dyn TokenSource>, AuthError> {
        let tenant = tenant.unwrap_or(self.config.oauth.tenant.as_str());
        Ok(Box::new(InteractiveBrowserCredential::new(&self.config, tenant)?))
    }
}
