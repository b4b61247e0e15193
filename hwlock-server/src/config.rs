//! Server configuration from command-line flags and environment.

use clap::{Parser, ValueEnum};
use hwlock_license::store::DEFAULT_BUSY_TIMEOUT;
use hwlock_license::{EngineConfig, StoreConfig, DEFAULT_DURATION_DAYS};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Storage backing selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database file.
    Sqlite,
    /// JSON file, written through on every change.
    Json,
    /// Volatile, for demos and tests.
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "hwlock-server")]
#[command(about = "License server binding license keys to hardware ids")]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "HWLOCK_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// HTTP port
    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Shared admin secret (X-Admin-Key header or basic-auth password)
    #[arg(long, env = "ADMIN_KEY", hide_env_values = true)]
    pub admin_key: String,

    /// Basic-auth user name for admin requests
    #[arg(long, env = "ADMIN_USER", default_value = "admin")]
    pub admin_user: String,

    /// Storage backing
    #[arg(long, env = "HWLOCK_BACKEND", value_enum, default_value = "sqlite")]
    pub backend: Backend,

    /// Database or JSON file path
    #[arg(long, env = "HWLOCK_DATABASE", default_value = "licenses.db")]
    pub database: PathBuf,

    /// Prefix of generated license keys
    #[arg(long, default_value = "LIC")]
    pub token_prefix: String,

    /// Lifetime of licenses issued without an explicit expiry
    #[arg(long, default_value_t = DEFAULT_DURATION_DAYS)]
    pub default_days: u32,

    /// How long a database call may wait on a competing writer
    #[arg(long, default_value_t = DEFAULT_BUSY_TIMEOUT.as_millis() as u64)]
    pub busy_timeout_ms: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Admin credential checked by the gateway.
#[derive(Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub key: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Everything the server needs to run.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub admin: AdminCredentials,
    pub store: StoreConfig,
    pub engine: EngineConfig,
}

impl ServerArgs {
    /// Validates the flags and builds the server configuration.
    pub fn into_config(self) -> anyhow::Result<ServerConfig> {
        if self.admin_key.trim().is_empty() {
            anyhow::bail!("admin key must not be empty");
        }
        let store = match self.backend {
            Backend::Sqlite => StoreConfig::Sqlite {
                path: self.database,
                busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            },
            Backend::Json => StoreConfig::JsonFile {
                path: self.database,
            },
            Backend::Memory => StoreConfig::Memory,
        };
        Ok(ServerConfig {
            listen: SocketAddr::new(self.bind, self.port),
            admin: AdminCredentials {
                user: self.admin_user,
                key: self.admin_key,
            },
            store,
            engine: EngineConfig {
                token_prefix: self.token_prefix,
                default_duration_days: self.default_days,
                ..EngineConfig::default()
            },
        })
    }
}
