//! Dream repository
//!
//! Handles dream CRUD with:
//! - Owner joined into every read (no N+1)
//! - Contributions for a whole listing fetched in one extra query
//! - Fulfillment as a single transaction with a compare-and-swap update

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};

use crate::fulfillment::{self, DreamSnapshot, FulfillError};
use crate::models::{Category, DreamChanges, DreamStatus, NewDream};
use super::{is_busy, DbError};

const DREAM_COLUMNS: &str = "id, user_id, name, description, image, cost, accumulated, category, \
                             status, location, views, date_added";

/// Dream record from database
#[derive(Debug, Clone, FromRow)]
pub struct Dream {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub cost: i64,
    pub accumulated: i64,
    pub category: Category,
    pub status: DreamStatus,
    pub location: String,
    pub views: i64,
    pub date_added: DateTime<Utc>,
}

impl Dream {
    pub fn snapshot(&self) -> DreamSnapshot {
        DreamSnapshot {
            category: self.category,
            cost: self.cost,
            accumulated: self.accumulated,
            status: self.status,
        }
    }
}

/// Public view of a dream's owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub photo: Option<String>,
}

/// In-kind contribution record
#[derive(Debug, Clone, FromRow)]
pub struct ContributionRecord {
    pub id: i64,
    pub dream_id: i64,
    pub user_id: i64,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Dream with owner and contributions, as shown by list/retrieve
#[derive(Debug, Clone)]
pub struct DreamDetail {
    pub dream: Dream,
    pub owner: Owner,
    pub contributions: Vec<ContributionRecord>,
}

/// Dream joined with its owner's public fields
#[derive(FromRow)]
struct DreamOwnerRow {
    #[sqlx(flatten)]
    dream: Dream,
    owner_first_name: String,
    owner_last_name: String,
    owner_photo: Option<String>,
}

impl DreamOwnerRow {
    fn into_detail(self, contributions: Vec<ContributionRecord>) -> DreamDetail {
        let owner = Owner {
            id: self.dream.user_id,
            first_name: self.owner_first_name,
            last_name: self.owner_last_name,
            photo: self.owner_photo,
        };
        DreamDetail {
            dream: self.dream,
            owner,
            contributions,
        }
    }
}

/// Fulfillment failure: either the request was refused or storage failed
#[derive(Debug, thiserror::Error)]
pub enum FulfillFailure {
    #[error(transparent)]
    Rejected(#[from] FulfillError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for FulfillFailure {
    fn from(e: sqlx::Error) -> Self {
        if is_busy(&e) {
            return Self::Db(lost_race());
        }
        Self::Db(DbError::Sqlx(e))
    }
}

fn lost_race() -> DbError {
    DbError::Conflict("The dream was changed by another request, please retry.".to_owned())
}

/// Dream repository
pub struct DreamRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DreamRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a dream owned by `owner_id`.
    pub async fn create(&self, owner_id: i64, new: &NewDream) -> Result<Dream, DbError> {
        let sql = format!(
            r#"
            INSERT INTO dreams (user_id, name, description, image, cost, category, location, date_added)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {DREAM_COLUMNS}
            "#
        );

        let dream = sqlx::query_as::<_, Dream>(&sql)
            .bind(owner_id)
            .bind(new.name.as_str())
            .bind(new.description.as_str())
            .bind(new.image.as_ref().map(|i| i.as_str()))
            .bind(new.cost.get())
            .bind(new.category)
            .bind(new.location.as_str())
            .bind(Utc::now())
            .fetch_one(self.pool)
            .await?;

        Ok(dream)
    }

    /// Get the bare dream row.
    pub async fn find(&self, id: i64) -> Result<Dream, DbError> {
        let sql = format!("SELECT {DREAM_COLUMNS} FROM dreams WHERE id = ?");
        sqlx::query_as::<_, Dream>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Dream", id))
    }

    /// List dreams newest first, optionally filtered by category.
    ///
    /// Two queries regardless of result size: dreams joined with owners,
    /// then every contribution for the same filter.
    pub async fn list(&self, category: Option<Category>) -> Result<Vec<DreamDetail>, DbError> {
        let rows = sqlx::query_as::<_, DreamOwnerRow>(
            r#"
            SELECT
                d.id, d.user_id, d.name, d.description, d.image, d.cost, d.accumulated,
                d.category, d.status, d.location, d.views, d.date_added,
                u.first_name AS owner_first_name,
                u.last_name AS owner_last_name,
                u.photo AS owner_photo
            FROM dreams d
            JOIN users u ON u.id = d.user_id
            WHERE (? IS NULL OR d.category = ?)
            ORDER BY d.date_added DESC, d.id DESC
            "#,
        )
        .bind(category)
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        let contributions = sqlx::query_as::<_, ContributionRecord>(
            r#"
            SELECT c.id, c.dream_id, c.user_id, c.description, c.date
            FROM contributions c
            JOIN dreams d ON d.id = c.dream_id
            WHERE (? IS NULL OR d.category = ?)
            ORDER BY c.date ASC, c.id ASC
            "#,
        )
        .bind(category)
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        let mut by_dream: HashMap<i64, Vec<ContributionRecord>> = HashMap::new();
        for c in contributions {
            by_dream.entry(c.dream_id).or_default().push(c);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let contributions = by_dream.remove(&row.dream.id).unwrap_or_default();
                row.into_detail(contributions)
            })
            .collect())
    }

    /// Get a dream with owner and contributions.
    pub async fn get(&self, id: i64) -> Result<DreamDetail, DbError> {
        let row = sqlx::query_as::<_, DreamOwnerRow>(
            r#"
            SELECT
                d.id, d.user_id, d.name, d.description, d.image, d.cost, d.accumulated,
                d.category, d.status, d.location, d.views, d.date_added,
                u.first_name AS owner_first_name,
                u.last_name AS owner_last_name,
                u.photo AS owner_photo
            FROM dreams d
            JOIN users u ON u.id = d.user_id
            WHERE d.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Dream", id))?;

        let contributions = self.contributions_for(id).await?;
        Ok(row.into_detail(contributions))
    }

    /// Contributions recorded against a dream, oldest first.
    pub async fn contributions_for(&self, dream_id: i64) -> Result<Vec<ContributionRecord>, DbError> {
        let contributions = sqlx::query_as::<_, ContributionRecord>(
            r#"
            SELECT id, dream_id, user_id, description, date
            FROM contributions
            WHERE dream_id = ?
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(dream_id)
        .fetch_all(self.pool)
        .await?;
        Ok(contributions)
    }

    /// Bump the view counter.
    pub async fn record_view(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE dreams SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Dream", id));
        }
        Ok(())
    }

    /// Apply a partial update of the user-writable fields.
    pub async fn update(&self, id: i64, changes: &DreamChanges) -> Result<Dream, DbError> {
        if changes.is_empty() {
            return self.find(id).await;
        }

        let sql = format!(
            r#"
            UPDATE dreams SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                image = CASE WHEN ? THEN ? ELSE image END,
                cost = COALESCE(?, cost),
                category = COALESCE(?, category),
                location = COALESCE(?, location)
            WHERE id = ?
            RETURNING {DREAM_COLUMNS}
            "#
        );

        let image = changes.image.as_ref();
        sqlx::query_as::<_, Dream>(&sql)
            .bind(changes.name.as_ref().map(|n| n.as_str()))
            .bind(changes.description.as_ref().map(|d| d.as_str()))
            .bind(image.is_some())
            .bind(image.and_then(|i| i.as_ref()).map(|i| i.as_str()))
            .bind(changes.cost.map(|c| c.get()))
            .bind(changes.category)
            .bind(changes.location.as_ref().map(|l| l.as_str()))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Dream", id))
    }

    /// Delete a dream; comments and contributions cascade.
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM dreams WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Dream", id));
        }
        Ok(())
    }

    /// Fulfill a dream on behalf of `user_id` (atomic).
    ///
    /// Reads the dream, runs [`fulfillment::fulfill`] on it, then writes the
    /// new state only if accumulated/status still match what was read. A
    /// concurrent fulfillment that got there first, or a lock wait that
    /// outlasts the busy timeout, turns into `DbError::Conflict` and nothing
    /// is written. On success the contribution record (in-kind only) and the
    /// user's dream counter are written in the same transaction.
    pub async fn fulfill(
        &self,
        dream_id: i64,
        user_id: i64,
        payload: &Value,
    ) -> Result<DreamDetail, FulfillFailure> {
        // Take the write lock before reading so concurrent fulfillments
        // queue on busy_timeout instead of failing on upgrade.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let sql = format!("SELECT {DREAM_COLUMNS} FROM dreams WHERE id = ?");
        let dream = sqlx::query_as::<_, Dream>(&sql)
            .bind(dream_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Dream", dream_id))?;

        let outcome = fulfillment::fulfill(&dream.snapshot(), payload)?;

        let updated = sqlx::query(
            r#"
            UPDATE dreams
            SET accumulated = ?, status = ?
            WHERE id = ? AND status = ? AND accumulated = ?
            "#,
        )
        .bind(outcome.accumulated)
        .bind(outcome.status)
        .bind(dream_id)
        .bind(DreamStatus::Pending)
        .bind(dream.accumulated)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(lost_race().into());
        }

        if let Some(description) = &outcome.record {
            sqlx::query(
                r#"
                INSERT INTO contributions (dream_id, user_id, description, date)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(dream_id)
            .bind(user_id)
            .bind(description)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE users SET num_of_dreams = num_of_dreams + 1 WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            dream_id,
            user_id,
            accumulated = outcome.accumulated,
            status = %outcome.status,
            "Dream fulfilled"
        );

        Ok(self.get(dream_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, create_pool, migrations, UserRepo};
    use crate::models::{Cost, Description, DreamName, Email, Location, NewUser, PersonName};
    use serde_json::json;

    async fn setup() -> (SqlitePool, i64) {
        let pool = create_memory_pool().await.unwrap();
        let owner = seed_owner(&pool).await;
        (pool, owner)
    }

    async fn seed_owner(pool: &SqlitePool) -> i64 {
        migrations::run(pool).await.unwrap();
        UserRepo::new(pool)
            .create(
                &NewUser {
                    email: Email::new("owner@example.com").unwrap(),
                    first_name: PersonName::new("Olga", "first_name").unwrap(),
                    last_name: PersonName::new("K", "last_name").unwrap(),
                    is_staff: false,
                },
                "hash",
            )
            .await
            .unwrap()
            .id
    }

    fn new_dream(category: Category, cost: i64) -> NewDream {
        NewDream {
            name: DreamName::new("Bike").unwrap(),
            description: Description::new("A red bike").unwrap(),
            image: None,
            cost: Cost::new(cost).unwrap(),
            category,
            location: Location::new("Lviv").unwrap(),
        }
    }

    #[tokio::test]
    async fn create_defaults() {
        let (pool, owner) = setup().await;
        let dream = DreamRepo::new(&pool)
            .create(owner, &new_dream(Category::Money, 100))
            .await
            .unwrap();
        assert_eq!(dream.accumulated, 0);
        assert_eq!(dream.status, DreamStatus::Pending);
        assert_eq!(dream.views, 0);
        assert_eq!(dream.user_id, owner);
    }

    #[tokio::test]
    async fn list_filters_by_category_and_joins_owner() {
        let (pool, owner) = setup().await;
        let repo = DreamRepo::new(&pool);
        repo.create(owner, &new_dream(Category::Money, 10)).await.unwrap();
        repo.create(owner, &new_dream(Category::Gifts, 10)).await.unwrap();
        repo.create(owner, &new_dream(Category::Gifts, 10)).await.unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 3);
        let gifts = repo.list(Some(Category::Gifts)).await.unwrap();
        assert_eq!(gifts.len(), 2);
        assert!(gifts.iter().all(|d| d.dream.category == Category::Gifts));
        assert_eq!(gifts[0].owner.first_name, "Olga");
    }

    #[tokio::test]
    async fn fulfill_money_accumulates_and_counts() {
        let (pool, owner) = setup().await;
        let repo = DreamRepo::new(&pool);
        let dream = repo.create(owner, &new_dream(Category::Money, 100)).await.unwrap();

        let detail = repo
            .fulfill(dream.id, owner, &json!({ "contribution_amount": 80 }))
            .await
            .unwrap();
        assert_eq!(detail.dream.accumulated, 80);
        assert_eq!(detail.dream.status, DreamStatus::Pending);

        let detail = repo
            .fulfill(dream.id, owner, &json!({ "contribution_amount": 30 }))
            .await
            .unwrap();
        assert_eq!(detail.dream.accumulated, 110);
        assert_eq!(detail.dream.status, DreamStatus::Completed);
        assert!(detail.contributions.is_empty());

        let user = UserRepo::new(&pool).get(owner).await.unwrap();
        assert_eq!(user.num_of_dreams, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_fulfillments_never_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("race.db").display());
        let pool = create_pool(&url).await.unwrap();
        let owner = seed_owner(&pool).await;
        let dream = DreamRepo::new(&pool)
            .create(owner, &new_dream(Category::Money, 1000))
            .await
            .unwrap();

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    DreamRepo::new(&pool)
                        .fulfill(dream.id, owner, &json!({ "contribution_amount": 1 }))
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(FulfillFailure::Db(DbError::Conflict(_))) => {}
                Err(other) => panic!("unexpected fulfillment error: {other}"),
            }
        }
        assert!(succeeded > 0);

        let stored = DreamRepo::new(&pool).find(dream.id).await.unwrap();
        assert_eq!(stored.accumulated, succeeded);
        let user = UserRepo::new(&pool).get(owner).await.unwrap();
        assert_eq!(user.num_of_dreams, succeeded);
    }

    #[tokio::test]
    async fn fulfill_in_kind_records_contribution() {
        let (pool, owner) = setup().await;
        let repo = DreamRepo::new(&pool);
        let dream = repo.create(owner, &new_dream(Category::Services, 5)).await.unwrap();

        let detail = repo
            .fulfill(dream.id, owner, &json!({ "contribution_description": "Will paint" }))
            .await
            .unwrap();
        assert_eq!(detail.dream.status, DreamStatus::Completed);
        assert_eq!(detail.contributions.len(), 1);
        assert_eq!(detail.contributions[0].description, "Will paint");
        assert_eq!(detail.contributions[0].user_id, owner);
    }

    #[tokio::test]
    async fn rejected_fulfillment_writes_nothing() {
        let (pool, owner) = setup().await;
        let repo = DreamRepo::new(&pool);
        let dream = repo.create(owner, &new_dream(Category::Gifts, 5)).await.unwrap();

        let err = repo
            .fulfill(dream.id, owner, &json!({ "contribution_description": "" }))
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillFailure::Rejected(FulfillError::MissingDescription)));

        let after = repo.get(dream.id).await.unwrap();
        assert_eq!(after.dream.status, DreamStatus::Pending);
        assert!(after.contributions.is_empty());
        assert_eq!(UserRepo::new(&pool).get(owner).await.unwrap().num_of_dreams, 0);
    }

    #[tokio::test]
    async fn completed_dream_cannot_be_fulfilled_again() {
        let (pool, owner) = setup().await;
        let repo = DreamRepo::new(&pool);
        let dream = repo.create(owner, &new_dream(Category::Gifts, 5)).await.unwrap();
        repo.fulfill(dream.id, owner, &json!({ "contribution_description": "A bike" }))
            .await
            .unwrap();

        let err = repo
            .fulfill(dream.id, owner, &json!({ "contribution_description": "Another" }))
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillFailure::Rejected(FulfillError::AlreadyFulfilled)));
        assert_eq!(repo.contributions_for(dream.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fulfill_missing_dream_is_not_found() {
        let (pool, owner) = setup().await;
        let err = DreamRepo::new(&pool)
            .fulfill(999, owner, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillFailure::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (pool, owner) = setup().await;
        let repo = DreamRepo::new(&pool);
        let dream = repo.create(owner, &new_dream(Category::Money, 100)).await.unwrap();

        let updated = repo
            .update(
                dream.id,
                &DreamChanges {
                    cost: Some(Cost::new(250).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.cost, 250);
        assert_eq!(updated.name, "Bike");

        repo.record_view(dream.id).await.unwrap();
        repo.record_view(dream.id).await.unwrap();
        assert_eq!(repo.find(dream.id).await.unwrap().views, 2);

        repo.delete(dream.id).await.unwrap();
        assert!(matches!(
            repo.find(dream.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            repo.delete(dream.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
