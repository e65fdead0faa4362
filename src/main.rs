//! azuretenants - list Azure tenants and their directory users.
//!
//! Signs in through the browser, lists every tenant the account can reach
//! and prints the first page of users in each of them.

#![deny(clippy::all)]

mod auth;
mod config;
mod directory;
mod error;
mod onboard;
mod report;
mod tenants;

use anyhow::{Context, Result};
use std::io::{self, Write};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use auth::{CredentialProvider, InteractiveBrowserProvider};
use config::Config;
use directory::DirectoryClient;
use tenants::TenantClient;

fn main() {
    // Load .env file (if present) before anything else
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            eprintln!("\nPlease set the following environment variables:");
            eprintln!("  {}=<your-azure-ad-client-id>", config::ENV_CLIENT_ID);
            eprintln!("  {}=<your-home-tenant-id>", config::ENV_TENANT_ID);
            eprintln!(
                "  {}=<redirect-url, e.g. http://localhost:28491/callback>",
                config::ENV_REDIRECT_URL
            );
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.app.name, env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
///
/// Logs go to stderr so stdout carries only the report.
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .init();
}

/// List tenants, then onboard each of them and print the report.
///
/// Only failures before the per-tenant loop are returned; tenant failures
/// are reported inline.
async fn run(config: Config) -> Result<()> {
    let provider = InteractiveBrowserProvider::new(config.clone());

    let home = provider
        .credential(None)
        .context("Failed to create home tenant credential")?;

    let tenant_client = TenantClient::new(&config.api).context("Failed to create ARM client")?;
    let tenants = tenant_client
        .list_tenants(home.as_ref(), &config.scopes.management)
        .await
        .context("Failed to list tenants")?;

    let mut stdout = io::stdout();
    report::write_tenant_table(&mut stdout, &tenants)?;
    stdout.flush()?;

    let directory = DirectoryClient::new(&config.api).context("Failed to create Graph client")?;
    let outcomes =
        onboard::onboard_all(&tenants, &provider, &directory, &config.scopes.graph).await;

    let mut stderr = io::stderr();
    for outcome in &outcomes {
        report::write_outcome(&mut stdout, &mut stderr, outcome)?;
    }
    stdout.flush()?;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        info!("{} of {} tenants could not be listed", failed, outcomes.len());
    }

    Ok(())
}
