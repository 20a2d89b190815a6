//! Admin account management
//!
//! Staff accounts may edit or delete any dream. They are only created here,
//! never through the API.

use anyhow::{Context, Result};
use clap::Parser;

use dreams_server::auth;
use dreams_server::db::{migrations, UserRepo};
use dreams_server::models::{Email, NewUser, Password, PersonName};

use super::{connect, DatabaseArgs};

/// Arguments for the create-superuser command
#[derive(Parser, Debug)]
pub struct CreateSuperuserArgs {
    /// Login email
    #[arg(long, env = "DREAMS_SUPERUSER_EMAIL")]
    pub email: String,

    /// Password (at least 8 characters)
    #[arg(long, env = "DREAMS_SUPERUSER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Create a staff account, or promote an existing account with that email
/// and give it the new password
pub async fn run_create_superuser(args: CreateSuperuserArgs) -> Result<()> {
    let email = Email::new(&args.email).context("Invalid email")?;
    let password = Password::new(&args.password).context("Invalid password")?;
    let new_user = NewUser {
        email,
        first_name: PersonName::new(&args.first_name, "first_name")?,
        last_name: PersonName::new(&args.last_name, "last_name")?,
        is_staff: true,
    };

    let pool = connect(&args.db.app_config()).await?;
    migrations::run(&pool)
        .await
        .context("Failed to bootstrap database schema")?;

    let repo = UserRepo::new(&pool);
    let hash = auth::hash_password(&password)?;
    let user = match repo.find_by_email(&new_user.email).await? {
        Some(_) => {
            let user = repo.promote_to_staff(&new_user.email, &hash).await?;
            println!(
                "Promoted existing user {} (id {}) to staff and reset password",
                user.email, user.id
            );
            user
        }
        None => {
            let user = repo.create(&new_user, &hash).await?;
            println!("Created superuser {} (id {})", user.email, user.id);
            user
        }
    };

    tracing::info!(user_id = user.id, "Superuser ready");
    pool.close().await;
    Ok(())
}
