//! Comment repository
//!
//! Likes are a bare counter: no per-user tracking, every call adds one.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::models::CommentText;
use super::DbError;

/// Comment joined with its author's public fields
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub dream_id: i64,
    pub user_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub author_first_name: String,
    pub author_last_name: String,
}

/// Comment repository
pub struct CommentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_dream(&self, dream_id: i64) -> Result<(), DbError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM dreams WHERE id = ?)")
            .bind(dream_id)
            .fetch_one(self.pool)
            .await?;

        if !exists {
            return Err(DbError::not_found("Dream", dream_id));
        }
        Ok(())
    }

    /// Comments on a dream, oldest first.
    pub async fn list_for_dream(&self, dream_id: i64) -> Result<Vec<Comment>, DbError> {
        self.ensure_dream(dream_id).await?;

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT
                c.id, c.dream_id, c.user_id, c.text, c.created_at, c.likes,
                u.first_name AS author_first_name,
                u.last_name AS author_last_name
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.dream_id = ?
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(dream_id)
        .fetch_all(self.pool)
        .await?;

        Ok(comments)
    }

    /// Add a comment by `user_id` to a dream.
    pub async fn create(
        &self,
        dream_id: i64,
        user_id: i64,
        text: &CommentText,
    ) -> Result<Comment, DbError> {
        self.ensure_dream(dream_id).await?;

        // SQLite has no data-modifying CTEs; insert, then read back the
        // joined row.
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO comments (dream_id, user_id, text, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(dream_id)
        .bind(user_id)
        .bind(text.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        self.get(id).await
    }

    /// Get a single comment by ID.
    pub async fn get(&self, id: i64) -> Result<Comment, DbError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT
                c.id, c.dream_id, c.user_id, c.text, c.created_at, c.likes,
                u.first_name AS author_first_name,
                u.last_name AS author_last_name
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Comment", id))
    }

    /// Add one like and return the new total.
    pub async fn like(&self, id: i64) -> Result<i64, DbError> {
        let likes: Option<(i64,)> =
            sqlx::query_as("UPDATE comments SET likes = likes + 1 WHERE id = ? RETURNING likes")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        likes
            .map(|(n,)| n)
            .ok_or_else(|| DbError::not_found("Comment", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, migrations, DreamRepo, UserRepo};
    use crate::models::{
        Category, Cost, Description, DreamName, Email, Location, NewDream, NewUser, PersonName,
    };

    async fn setup() -> (SqlitePool, i64, i64) {
        let pool = create_memory_pool().await.unwrap();
        migrations::run(&pool).await.unwrap();
        let user = UserRepo::new(&pool)
            .create(
                &NewUser {
                    email: Email::new("c@example.com").unwrap(),
                    first_name: PersonName::new("Cat", "first_name").unwrap(),
                    last_name: PersonName::default(),
                    is_staff: false,
                },
                "hash",
            )
            .await
            .unwrap();
        let dream = DreamRepo::new(&pool)
            .create(
                user.id,
                &NewDream {
                    name: DreamName::new("Books").unwrap(),
                    description: Description::new("Some books").unwrap(),
                    image: None,
                    cost: Cost::new(10).unwrap(),
                    category: Category::Gifts,
                    location: Location::default(),
                },
            )
            .await
            .unwrap();
        (pool, user.id, dream.id)
    }

    #[tokio::test]
    async fn create_and_list() {
        let (pool, user, dream) = setup().await;
        let repo = CommentRepo::new(&pool);

        let first = repo
            .create(dream, user, &CommentText::new("first").unwrap())
            .await
            .unwrap();
        repo.create(dream, user, &CommentText::new("second").unwrap())
            .await
            .unwrap();

        assert_eq!(first.likes, 0);
        assert_eq!(first.author_first_name, "Cat");

        let comments = repo.list_for_dream(dream).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[tokio::test]
    async fn like_increments_without_dedup() {
        let (pool, user, dream) = setup().await;
        let repo = CommentRepo::new(&pool);
        let comment = repo
            .create(dream, user, &CommentText::new("nice").unwrap())
            .await
            .unwrap();

        assert_eq!(repo.like(comment.id).await.unwrap(), 1);
        assert_eq!(repo.like(comment.id).await.unwrap(), 2);
        assert_eq!(repo.get(comment.id).await.unwrap().likes, 2);
    }

    #[tokio::test]
    async fn unknown_targets_are_not_found() {
        let (pool, user, _) = setup().await;
        let repo = CommentRepo::new(&pool);

        assert!(matches!(
            repo.like(404).await.unwrap_err(),
            DbError::NotFound { resource: "Comment", .. }
        ));
        assert!(matches!(
            repo.list_for_dream(404).await.unwrap_err(),
            DbError::NotFound { resource: "Dream", .. }
        ));
        assert!(matches!(
            repo.create(404, user, &CommentText::new("x").unwrap())
                .await
                .unwrap_err(),
            DbError::NotFound { resource: "Dream", .. }
        ));
    }
}
