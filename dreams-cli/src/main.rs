//! dreams CLI - runs and administers the dreams API
//!
//! - `serve`: HTTP API server
//! - `migrate`: create missing tables
//! - `create-superuser`: staff account for moderation
//!
//! A `.env` file in the working directory is loaded before arguments are
//! parsed, so every `env = ...` flag can live there.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "dreams",
    author,
    version,
    about = "Backend for dreams: wishes, contributions, comments and likes"
)]
struct Cli {
    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create missing database tables and indexes
    Migrate(commands::migrate::MigrateArgs),
    /// Create a staff account (or promote an existing one)
    CreateSuperuser(commands::users::CreateSuperuserArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::CreateSuperuser(args) => commands::run_create_superuser(args).await?,
    }
    Ok(())
}
