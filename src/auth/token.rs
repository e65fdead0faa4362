//! Bearer tokens that are zeroized on drop.

use chrono::{DateTime, Duration, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::oauth::TokenResponse;

/// A short-lived bearer token and the instant it stops being valid.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken {
    token: String,
    #[zeroize(skip)]
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// Build a token from an Azure AD token response received just now.
    pub fn from_response(response: &TokenResponse) -> Self {
        Self::new(
            response.access_token.clone(),
            Utc::now() + Duration::seconds(response.expires_in as i64),
        )
    }

    /// The raw bearer token.
    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}
