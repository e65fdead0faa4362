//! Tenant data models for the Azure Resource Manager tenants API.

use serde::{Deserialize, Deserializer};

/// An Azure AD tenant the signed-in identity can reach.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tenant {
    /// ARM resource id, e.g. `/tenants/{tenantId}`.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,

    /// Tenant GUID used to sign in to the tenant.
    #[serde(deserialize_with = "null_as_default")]
    pub tenant_id: String,

    /// ISO country code of the tenant.
    #[serde(deserialize_with = "null_as_default")]
    pub country_code: String,

    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,

    /// Every domain registered in the tenant.
    #[serde(deserialize_with = "null_as_default")]
    pub domains: Vec<String>,

    /// Relationship to the signed-in identity ("Home", "ProjectedBy", "ManagedBy").
    #[serde(deserialize_with = "null_as_default")]
    pub tenant_category: String,

    #[serde(deserialize_with = "null_as_default")]
    pub default_domain: String,

    /// Tenant flavour, e.g. "AAD" or "AAD B2C".
    #[serde(deserialize_with = "null_as_default")]
    pub tenant_type: String,
}

/// ARM sends `null` for some fields; treat it like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of the `GET /tenants` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TenantListResponse {
    #[serde(default)]
    pub value: Vec<Tenant>,

    #[serde(rename = "nextLink")]
    pub next_link: Option<String>,
}
