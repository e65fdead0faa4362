//! Per-tenant onboarding: sign in to each tenant and list its users.

use tracing::{info, warn};

use crate::auth::CredentialProvider;
use crate::directory::{DirectoryClient, UserRecord};
use crate::error::{AppError, AuthError};
use crate::tenants::Tenant;

/// What happened when a single tenant was onboarded.
#[derive(Debug)]
pub struct TenantOutcome {
    pub tenant: Tenant,
    pub result: Result<Vec<UserRecord>, AppError>,
}

/// Onboard every tenant in order.
///
/// A failing tenant is recorded and the loop moves on to the next one.
pub async fn onboard_all(
    tenants: &[Tenant],
    provider: &dyn CredentialProvider,
    directory: &DirectoryClient,
    scopes: &[String],
) -> Vec<TenantOutcome> {
    let mut outcomes = Vec::with_capacity(tenants.len());

    for (idx, tenant) in tenants.iter().enumerate() {
        info!(
            "Onboarding tenant {}/{}: {} ({})",
            idx + 1,
            tenants.len(),
            tenant.display_name,
            tenant.tenant_id
        );

        let result = onboard(tenant, provider, directory, scopes).await;
        if let Err(e) = &result {
            warn!("Tenant {} failed: {}", tenant.tenant_id, e);
        }

        outcomes.push(TenantOutcome {
            tenant: tenant.clone(),
            result,
        });
    }

    outcomes
}

async fn onboard(
    tenant: &Tenant,
    provider: &dyn CredentialProvider,
    directory: &DirectoryClient,
    scopes: &[String],
) -> Result<Vec<UserRecord>, AppError> {
    if tenant.tenant_id.is_empty() {
        return Err(AuthError::MissingTenantId.into());
    }

    let credential = provider.credential(Some(tenant.tenant_id.as_str()))?;
    let users = directory.list_users(credential.as_ref(), scopes).await?;
    info!("Tenant {} has {} users on the first page", tenant.tenant_id, users.len());
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{FailingToken, StaticToken};
    use crate::auth::TokenSource;
    use crate::config::tests::test_config;
    use crate::error::ApiError;
    use std::sync::Mutex;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Hands out `token-{tenant}` tokens, or a failing credential for `fail_for`.
    struct FakeProvider {
        fail_for: Option<&'static str>,
        asked: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(fail_for: Option<&'static str>) -> Self {
            Self {
                fail_for,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl CredentialProvider for FakeProvider {
        fn credential(&self, tenant: Option<&str>) -> Result<Box<dyn TokenSource>, AuthError> {
            let tenant = tenant.unwrap_or("home").to_string();
            self.asked.lock().unwrap().push(tenant.clone());
            if self.fail_for == Some(tenant.as_str()) {
                return Ok(Box::new(FailingToken));
            }
            Ok(Box::new(StaticToken::new(&format!("token-{}", tenant))))
        }
    }

    fn tenant(id: &str, name: &str) -> Tenant {
        Tenant {
            tenant_id: id.to_string(),
            display_name: name.to_string(),
            default_domain: format!("{}.com", name.to_lowercase()),
            ..Tenant::default()
        }
    }

    async fn directory_for(server: &MockServer) -> DirectoryClient {
        let mut api = test_config().api;
        api.graph_base_url = server.uri();
        DirectoryClient::new(&api).unwrap()
    }

    async fn mount_users(server: &MockServer, token: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_failed_tenant_does_not_stop_the_next() {
        let server = MockServer::start().await;
        mount_users(
            &server,
            "token-a",
            403,
            serde_json::json!({"error": {"code": "Authorization_RequestDenied"}}),
        )
        .await;
        mount_users(
            &server,
            "token-b",
            200,
            serde_json::json!({"value": [{"id": "u1", "displayName": "Bob", "mail": "bob@fabrikam.com"}]}),
        )
        .await;

        let provider = FakeProvider::new(None);
        let tenants = vec![tenant("a", "Contoso"), tenant("b", "Fabrikam")];
        let outcomes = onboard_all(
            &tenants,
            &provider,
            &directory_for(&server).await,
            &test_config().scopes.graph,
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].tenant.tenant_id, "a");
        assert!(matches!(
            outcomes[0].result,
            Err(AppError::Api(ApiError::Status { status: 403, .. }))
        ));
        assert_eq!(outcomes[1].tenant.tenant_id, "b");
        let users = outcomes[1].result.as_ref().unwrap();
        assert_eq!(users[0].display_name, "Bob");
        assert_eq!(*provider.asked.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_sign_in_failure_is_per_tenant() {
        let server = MockServer::start().await;
        mount_users(&server, "token-b", 200, serde_json::json!({"value": []})).await;

        let provider = FakeProvider::new(Some("a"));
        let tenants = vec![tenant("a", "Contoso"), tenant("b", "Fabrikam")];
        let outcomes = onboard_all(
            &tenants,
            &provider,
            &directory_for(&server).await,
            &test_config().scopes.graph,
        )
        .await;

        assert!(matches!(outcomes[0].result, Err(AppError::Auth(AuthError::OAuthFailed(_)))));
        assert!(outcomes[1].result.as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_tenant_id_never_requests_credential() {
        let server = MockServer::start().await;
        mount_users(&server, "token-b", 200, serde_json::json!({"value": []})).await;

        let provider = FakeProvider::new(None);
        let tenants = vec![tenant("", "Broken"), tenant("b", "Fabrikam")];
        let outcomes = onboard_all(
            &tenants,
            &provider,
            &directory_for(&server).await,
            &test_config().scopes.graph,
        )
        .await;

        assert!(matches!(
            outcomes[0].result,
            Err(AppError::Auth(AuthError::MissingTenantId))
        ));
        assert!(outcomes[1].result.is_ok());
        assert_eq!(*provider.asked.lock().unwrap(), vec!["b"]);
    }
}
