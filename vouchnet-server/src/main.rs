//! vouchnet-server: the HTTP face of the identity reputation service.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     VOUCHNET SERVER                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  HTTP API (8000)       ←── signed actions and queries    │
//! │  ActionService         ←── verify / authorize / mutate   │
//! │  TrustEngine           ←── recursive IDT evaluation      │
//! │  Bootstrap files       ←── admins, moderators, genesis   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup order: `.env`, CLI arguments, logging, bootstrap files, then the
//! listener. Shutdown is graceful on ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use vouchnet_core::genesis;
use vouchnet_core::nonce::{InMemoryNonceRegistry, NonceRegistry};
use vouchnet_core::roles::{InMemoryRoleStore, RoleStore};
use vouchnet_core::service::{ActionService, QueryService};
use vouchnet_core::store::{InMemoryTrustStore, TrustStore};

mod config;
mod routes;

use config::ServerConfig;
use routes::AppState;

/// Identity reputation server maintaining a network of trust.
#[derive(Parser, Debug)]
#[command(name = "vouchnet-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Listen port
    #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Listen host
    #[arg(long, env = "HOST", default_value = config::DEFAULT_HOST)]
    host: String,

    /// Admin identities loaded at startup
    #[arg(long, default_value = config::DEFAULT_ADMINS_PATH)]
    admins_file: PathBuf,

    /// Moderator identities loaded at startup
    #[arg(long, default_value = config::DEFAULT_MODERATORS_PATH)]
    moderators_file: PathBuf,

    /// Genesis balances loaded at startup
    #[arg(long, default_value = config::DEFAULT_GENESIS_PATH)]
    genesis_file: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables from `.env` before clap reads them
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .init();

    info!("vouchnet-server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        admins_path: args.admins_file,
        moderators_path: args.moderators_file,
        genesis_path: args.genesis_file,
    };

    let bootstrap = config::load_bootstrap(&config)?;
    info!(
        admins = bootstrap.admins.len(),
        moderators = bootstrap.moderators.len(),
        genesis = bootstrap.genesis.len(),
        "bootstrap state loaded"
    );

    let trust: Arc<dyn TrustStore> = Arc::new(InMemoryTrustStore::new());
    let roles: Arc<dyn RoleStore> = Arc::new(InMemoryRoleStore::new());
    let nonces: Arc<dyn NonceRegistry> = Arc::new(InMemoryNonceRegistry::new());

    genesis::apply_admins(roles.as_ref(), &bootstrap.admins)?;
    genesis::apply_moderators(roles.as_ref(), &bootstrap.moderators)?;
    genesis::apply_genesis(trust.as_ref(), &bootstrap.genesis)?;

    let state = Arc::new(AppState {
        actions: ActionService::new(trust.clone(), roles.clone(), nonces),
        queries: QueryService::new(trust, roles),
    });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    info!("listening on {}", config.listen_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("vouchnet-server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
