//! HTTP server command
//!
//! Bootstraps the schema, then runs the dreams API until Ctrl+C / SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use dreams_server::db::migrations;
use dreams_server::http::{run_server, ServerConfig};

use super::{connect, DatabaseArgs};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "DREAMS_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Do not create missing tables on startup
    #[arg(long)]
    pub skip_migrations: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let app_config = args.db.app_config();
    let pool = connect(&app_config).await?;

    if !args.skip_migrations {
        migrations::run(&pool)
            .await
            .context("Failed to bootstrap database schema")?;
    }

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        timeout_secs: args.timeout,
    };

    tracing::info!("Starting dreams server on {}", args.bind);

    // Blocks until shutdown
    run_server(pool, config, app_config)
        .await
        .context("Server error")?;

    Ok(())
}
