//! Schema bootstrap
//!
//! Idempotent `CREATE ... IF NOT EXISTS` statements, safe to run on every
//! startup.

use sqlx::SqlitePool;

/// Create all tables and indexes
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            photo TEXT,
            location TEXT NOT NULL DEFAULT '',
            about_me TEXT NOT NULL DEFAULT '',
            num_of_dreams INTEGER NOT NULL DEFAULT 0 CHECK (num_of_dreams >= 0),
            is_staff BOOLEAN NOT NULL DEFAULT FALSE,
            date_joined TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dreams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            image TEXT,
            cost INTEGER NOT NULL CHECK (cost > 0),
            accumulated INTEGER NOT NULL DEFAULT 0,
            category TEXT NOT NULL CHECK (category IN ('money', 'services', 'gifts')),
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
            location TEXT NOT NULL DEFAULT '',
            views INTEGER NOT NULL DEFAULT 0,
            date_added TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contributions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dream_id INTEGER NOT NULL REFERENCES dreams(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            date TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dream_id INTEGER NOT NULL REFERENCES dreams(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            likes INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Dream indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_dreams_category ON dreams(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_dreams_user ON dreams(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contributions_dream ON contributions(dream_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_dream ON comments(dream_id, created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
