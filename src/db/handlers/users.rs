//! Database repository for user accounts.

use crate::types::UserId;
use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse},
};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;

/// Filter for listing accounts
#[derive(Debug, Clone)]
pub struct AccountFilter {
    pub skip: i64,
    pub limit: i64,
}

impl AccountFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Accounts<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Accounts<'c> {
    type CreateRequest = UserCreateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = AccountFilter;

    /// Insert a new account row.
    ///
    /// Duplicate usernames surface as `DbError::UniqueViolation` from the
    /// engine's UNIQUE constraint; there is deliberately no prior existence
    /// check that could race.
    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (username, password_hash, role, trial_until, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(request.trial_until)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users =
            sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
                .bind(filter.limit)
                .bind(filter.skip)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(users)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Accounts<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Flip the enabled flag. Returns false when no such row exists.
    #[instrument(skip(self), err)]
    pub async fn set_enabled(&mut self, id: UserId, enabled: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the trial expiry. Returns false when no such row exists.
    ///
    /// This is the only write path for `trial_until` after creation; the
    /// login flow never touches it.
    #[instrument(skip(self), err)]
    pub async fn set_trial_until(&mut self, id: UserId, trial_until: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET trial_until = ? WHERE id = ?")
            .bind(trial_until)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a successful interactive login: stamp `last_login` and bump the
    /// monotone `login_count`. Concurrent logins may both succeed with
    /// last-writer-wins on the timestamp; the counter increment is atomic in
    /// the engine.
    #[instrument(skip(self, now), err)]
    pub async fn record_login(&mut self, username: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ?, login_count = login_count + 1 WHERE username = ?")
            .bind(now)
            .bind(username)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::errors::DbError;
    use sqlx::SqlitePool;

    fn create_request(username: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            username: username.to_string(),
            password_hash: "$argon2id$fake-hash".to_string(),
            role: Role::User,
            trial_until: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let created = repo.create(&create_request("alice")).await.unwrap();
        assert_eq!(created.username, "alice");
        assert!(created.enabled);
        assert_eq!(created.role, Role::User);
        assert_eq!(created.login_count, 0);
        assert!(created.last_login.is_none());

        let by_name = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_username_is_engine_enforced(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        repo.create(&create_request("bob")).await.unwrap();
        let err = repo.create(&create_request("bob")).await.unwrap_err();

        match err {
            DbError::UniqueViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("users.username"));
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }

        // Exactly one surviving row
        let users = repo.list(&AccountFilter::new(0, 100)).await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_record_login_bumps_counter(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let user = repo.create(&create_request("carol")).await.unwrap();
        let now = Utc::now();

        repo.record_login("carol", now).await.unwrap();
        repo.record_login("carol", now).await.unwrap();

        let user = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.login_count, 2);
        assert!(user.last_login.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_set_enabled_and_trial(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let user = repo.create(&create_request("dave")).await.unwrap();

        assert!(repo.set_enabled(user.id, false).await.unwrap());
        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(!fetched.enabled);

        let until = Utc::now() + chrono::Duration::days(30);
        assert!(repo.set_trial_until(user.id, until).await.unwrap());
        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.trial_until.unwrap().timestamp(), until.timestamp());

        // Absent ids are a clean no-op
        assert!(!repo.set_enabled(9999, true).await.unwrap());
        assert!(!repo.set_trial_until(9999, until).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let user = repo.create(&create_request("erin")).await.unwrap();
        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_pagination(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        for name in ["u1", "u2", "u3"] {
            repo.create(&create_request(name)).await.unwrap();
        }

        let page = repo.list(&AccountFilter::new(1, 2)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].username, "u2");
    }
}
