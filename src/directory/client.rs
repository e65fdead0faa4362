//! Microsoft Graph client for listing directory users.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{debug, warn};
use uuid::Uuid;

use super::models::{UserListResponse, UserRecord};
use crate::auth::TokenSource;
use crate::config::ApiConfig;
use crate::error::{ApiError, AppError};

/// HTTP request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// HTTP connection timeout.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Microsoft Graph directory client.
pub struct DirectoryClient {
    http_client: Client,
    base_url: String,
}

impl DirectoryClient {
    /// Create a new directory client.
    pub fn new(api: &ApiConfig) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http_client,
            base_url: api.graph_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the first page of users from the tenant `credential` is bound to.
    ///
    /// Page size is whatever Graph defaults to; `@odata.nextLink` is logged and
    /// not followed.
    pub async fn list_users(
        &self,
        credential: &dyn TokenSource,
        scopes: &[String],
    ) -> Result<Vec<UserRecord>, AppError> {
        let token = credential.get_token(scopes).await?;

        let url = format!("{}/users", self.base_url);
        let request_id = Uuid::new_v4().to_string();
        debug!("Fetching users from {} (client-request-id {})", url, request_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token.secret())
            .header(ACCEPT, "application/json")
            .header("client-request-id", &request_id)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Network)?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let page: UserListResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        if page.next_link.is_some() {
            warn!(
                "Directory has more than {} users; only the first page is listed",
                page.value.len()
            );
        }

        Ok(page.value.into_iter().map(UserRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::StaticToken;
    use crate::config::tests::test_config;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> DirectoryClient {
        let mut api = test_config().api;
        api.graph_base_url = format!("{}/beta", server.uri());
        DirectoryClient::new(&api).unwrap()
    }

    #[tokio::test]
    async fn test_list_users_maps_records_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/beta/users"))
            .and(header("authorization", "Bearer graph-token"))
            .and(header_exists("client-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "@odata.context": "https://graph.microsoft.com/beta/$metadata#users",
                "value": [
                    {"id": "u1", "displayName": "Adele Vance", "mail": "adele@contoso.com"},
                    {"id": "u2", "displayName": "Guest User", "mail": null},
                    {"id": "u3"}
                ],
                "@odata.nextLink": "https://graph.microsoft.com/beta/users?$skiptoken=abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = StaticToken::new("graph-token");
        let users = client_for(&server)
            .await
            .list_users(&credential, &test_config().scopes.graph)
            .await
            .unwrap();

        assert_eq!(users.len(), 3);
        assert_eq!(users[0].display_name, "Adele Vance");
        assert_eq!(users[1].mail, "");
        assert_eq!(
            users[2],
            UserRecord {
                display_name: String::new(),
                id: "u3".into(),
                mail: String::new(),
            }
        );
        assert_eq!(
            credential.requested.lock().unwrap()[0],
            vec!["https://graph.microsoft.com/Directory.ReadWrite.All".to_string()]
        );
    }

    #[tokio::test]
    async fn test_forbidden_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/beta/users"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Authorization_RequestDenied"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .await
            .list_users(&StaticToken::new("t"), &test_config().scopes.graph)
            .await;

        match result {
            Err(AppError::Api(ApiError::Status { status, body })) => {
                assert_eq!(status, 403);
                assert_eq!(body, "Authorization_RequestDenied");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/beta/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .await
            .list_users(&StaticToken::new("t"), &test_config().scopes.graph)
            .await;

        assert!(matches!(result, Err(AppError::Api(ApiError::Decode(_)))));
    }
}
