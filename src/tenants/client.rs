//! Azure Resource Manager client for tenant discovery.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::models::{Tenant, TenantListResponse};
use crate::auth::TokenSource;
use crate::config::ApiConfig;
use crate::error::{ApiError, AppError};

/// HTTP request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP connection timeout.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lists the tenants visible to the signed-in identity.
pub struct TenantClient {
    http_client: Client,
    base_url: String,
    api_version: String,
}

impl TenantClient {
    /// Create a new tenant client.
    pub fn new(api: &ApiConfig) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http_client,
            base_url: api.management_base_url.trim_end_matches('/').to_string(),
            api_version: api.management_api_version.clone(),
        })
    }

    /// List the first page of tenants, in the order the API returns them.
    ///
    /// A `nextLink` in the response is logged and not followed.
    pub async fn list_tenants(
        &self,
        credential: &dyn TokenSource,
        scopes: &[String],
    ) -> Result<Vec<Tenant>, AppError> {
        let token = credential.get_token(scopes).await?;

        let url = format!("{}/tenants?api-version={}", self.base_url, self.api_version);
        debug!("Fetching tenants from {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token.secret())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Network)?;

        if status != StatusCode::OK {
            debug!("Failed to list tenants: HTTP {} - {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let page: TenantListResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        if let Some(next_link) = &page.next_link {
            warn!(
                "Tenant listing has more pages; only the first is used (nextLink: {})",
                next_link
            );
        }

        for tenant in &page.value {
            debug!(
                "Tenant {} ({}): {} {} country={} domains={}",
                tenant.tenant_id,
                tenant.id,
                tenant.tenant_category,
                tenant.tenant_type,
                tenant.country_code,
                tenant.domains.len()
            );
        }

        info!("Found {} tenants", page.value.len());
        Ok(page.value)
    }
}
