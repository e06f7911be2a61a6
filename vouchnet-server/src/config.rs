//! Server configuration and bootstrap file loading.
//!
//! Listen address comes from CLI flags with environment fallback (`PORT`,
//! `HOST`); a `.env` file is honored if present. Bootstrap files are read
//! once at startup: a missing file is normal for a fresh deployment and only
//! logged, a malformed one aborts startup.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::warn;

use vouchnet_core::genesis::GenesisBalance;
use vouchnet_core::UserId;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_ADMINS_PATH: &str = "admins.json";
pub const DEFAULT_MODERATORS_PATH: &str = "moderators.json";
pub const DEFAULT_GENESIS_PATH: &str = "genesis.json";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub admins_path: PathBuf,
    pub moderators_path: PathBuf,
    pub genesis_path: PathBuf,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            admins_path: DEFAULT_ADMINS_PATH.into(),
            moderators_path: DEFAULT_MODERATORS_PATH.into(),
            genesis_path: DEFAULT_GENESIS_PATH.into(),
        }
    }
}

/// Identities seeded at startup.
#[derive(Debug, Default)]
pub struct BootstrapState {
    pub admins: Vec<UserId>,
    pub moderators: Vec<UserId>,
    pub genesis: Vec<GenesisBalance>,
}

/// Read `admins.json`, `moderators.json` and `genesis.json` if they exist.
pub fn load_bootstrap(config: &ServerConfig) -> anyhow::Result<BootstrapState> {
    Ok(BootstrapState {
        admins: load_json_or_default(&config.admins_path)?,
        moderators: load_json_or_default(&config.moderators_path)?,
        genesis: load_json_or_default(&config.genesis_path)?,
    })
}

fn load_json_or_default<T: serde::de::DeserializeOwned + Default>(
    path: &Path,
) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("skipping {}: {err}", path.display());
            return Ok(T::default());
        }
    };
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
