//! Schema bootstrap command

use anyhow::{Context, Result};
use clap::Parser;

use dreams_server::db::migrations;

use super::{connect, DatabaseArgs};

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Create any missing tables and indexes
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = args.db.app_config();
    let pool = connect(&config).await?;

    migrations::run(&pool)
        .await
        .context("Failed to bootstrap database schema")?;
    pool.close().await;

    println!("Schema is up to date ({})", config.database_url);
    Ok(())
}
