//! Azure tenant discovery through the Azure Resource Manager API.

pub mod client;
pub mod models;

pub use client::TenantClient;
pub use models::Tenant;
