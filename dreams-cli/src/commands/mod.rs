//! Command implementations for the dreams CLI

pub mod migrate;
pub mod serve;
pub mod users;

use anyhow::{Context, Result};
use clap::Args;

use dreams_server::db::{create_pool_with_options, SqlitePool};
use dreams_server::AppConfig;

pub use migrate::run_migrate;
pub use serve::run_serve;
pub use users::run_create_superuser;

/// Database options shared by every command
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database URL (overrides environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pool connections
    #[arg(long, env = "DREAMS_DB_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,
}

impl DatabaseArgs {
    /// Environment config with the command line applied on top.
    pub fn app_config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        config
    }
}

/// Open the pool described by `config`.
pub async fn connect(config: &AppConfig) -> Result<SqlitePool> {
    tracing::debug!(database_url = %config.database_url, "Connecting to database");
    create_pool_with_options(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))
}
