//! Admin-only account administration endpoints.
//!
//! Every handler takes [`AdminUser`], so a valid non-admin session gets 403
//! before any work happens. Mutations aimed at an absent id are no-ops.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::{
    AppState,
    api::models::users::{AddUserForm, EnabledUpdate, TrialUpdate, UserResponse},
    auth::{current_user::AdminUser, password, trial},
    db::{
        errors::DbError,
        handlers::{AccountFilter, Accounts, Repository},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    types::UserId,
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListUsersParams {
    /// Number of accounts to skip
    #[serde(default)]
    pub skip: i64,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// List accounts
#[utoipa::path(
    get,
    path = "/admin/users",
    params(ListUsersParams),
    tag = "users",
    responses(
        (status = 200, description = "Accounts, ordered by id", body = Vec<UserResponse>),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session is not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<Vec<UserResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let users = Accounts::new(&mut conn)
        .list(&AccountFilter::new(params.skip, params.limit))
        .await?;

    let now = Utc::now();
    Ok(Json(users.into_iter().map(|u| UserResponse::from_db(u, now)).collect()))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body(content = AddUserForm, content_type = "application/x-www-form-urlencoded"),
    tag = "users",
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Empty username, short password, or trial days out of range"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session is not an admin"),
        (status = 409, description = "Username already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Form(form): Form<AddUserForm>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    if form.username.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Username must not be empty".to_string(),
        });
    }
    let password_config = &state.config.auth.password;
    if form.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }

    // Hash on a blocking thread; argon2 is CPU-bound by design.
    let plaintext = form.password.clone();
    let params = state.config.argon2_params();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&plaintext, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let now = Utc::now();
    let trial_days = form.trial_days.unwrap_or(state.config.auth.trial.default_days);
    let trial_until = trial::extend(now, trial_days).ok_or_else(|| Error::BadRequest {
        message: format!("Trial days out of range: {trial_days}"),
    })?;
    let create_request = UserCreateDBRequest {
        username: form.username,
        password_hash,
        role: crate::api::models::users::Role::User,
        trial_until: Some(trial_until),
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let created = Accounts::new(&mut conn).create(&create_request).await?;
    info!(username = %created.username, admin = %admin.0.username, "account created");

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(created, now))))
}

/// Delete an account
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    tag = "users",
    responses(
        (status = 204, description = "Account deleted (or did not exist)"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session is not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let deleted = Accounts::new(&mut conn).delete(id).await?;
    if deleted {
        info!(id, admin = %admin.0.username, "account deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Enable or disable an account
#[utoipa::path(
    put,
    path = "/admin/users/{id}/enabled",
    params(("id" = i64, Path, description = "Account id")),
    request_body = EnabledUpdate,
    tag = "users",
    responses(
        (status = 204, description = "Flag updated (no-op if the account does not exist)"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session is not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn set_user_enabled(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<UserId>,
    Json(update): Json<EnabledUpdate>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let changed = Accounts::new(&mut conn).set_enabled(id, update.enabled).await?;
    if changed {
        info!(id, enabled = update.enabled, admin = %admin.0.username, "account flag updated");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Reset an account's trial window
///
/// Sets the trial end to now + `days`, replacing any previous end;
/// consecutive calls never stack.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/trial",
    params(("id" = i64, Path, description = "Account id")),
    request_body = TrialUpdate,
    tag = "users",
    responses(
        (status = 204, description = "Trial reset (no-op if the account does not exist)"),
        (status = 400, description = "Trial days out of range"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session is not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn set_user_trial(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<UserId>,
    Json(update): Json<TrialUpdate>,
) -> Result<StatusCode, Error> {
    let trial_until = trial::extend(Utc::now(), update.days).ok_or_else(|| Error::BadRequest {
        message: format!("Trial days out of range: {}", update.days),
    })?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let changed = Accounts::new(&mut conn).set_trial_until(id, trial_until).await?;
    if changed {
        info!(id, days = update.days, admin = %admin.0.username, "trial window reset");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{admin_cookie, create_test_server, seed_user, session_cookie};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_mutations_require_a_session(pool: SqlitePool) {
        let server = create_test_server(pool).await;

        server.get("/admin/users").await.assert_status_unauthorized();
        server
            .post("/admin/users")
            .form(&json!({"username": "x", "password": "password123"}))
            .await
            .assert_status_unauthorized();
        server.delete("/admin/users/1").await.assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_admin_session_is_forbidden(pool: SqlitePool) {
        seed_user(&pool, "mallory", "pw", Role::User, None, true).await;
        let server = create_test_server(pool.clone()).await;
        let cookie = session_cookie("mallory");

        let response = server.get("/admin/users").add_header("cookie", &cookie).await;
        response.assert_status_forbidden();

        let response = server
            .put("/admin/users/1/enabled")
            .add_header("cookie", &cookie)
            .json(&json!({"enabled": false}))
            .await;
        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_list_users(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        let server = create_test_server(pool).await;

        let response = server
            .post("/admin/users")
            .add_header("cookie", &cookie)
            .form(&json!({"username": "newbie", "password": "password123", "trial_days": 14}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let created: serde_json::Value = response.json();
        assert_eq!(created["username"], "newbie");
        assert_eq!(created["role"], "user");
        assert_eq!(created["trial_days_left"], 14);

        // No trial_days in the form falls back to the configured default
        let response = server
            .post("/admin/users")
            .add_header("cookie", &cookie)
            .form(&json!({"username": "defaulted", "password": "password123"}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let created: serde_json::Value = response.json();
        assert_eq!(created["trial_days_left"], 7);

        let response = server.get("/admin/users").add_header("cookie", &cookie).await;
        response.assert_status_ok();
        let users: Vec<serde_json::Value> = response.json();
        let names: Vec<&str> = users.iter().map(|u| u["username"].as_str().unwrap()).collect();
        assert!(names.contains(&"admin"));
        assert!(names.contains(&"newbie"));
        // The hash never reaches the wire
        assert!(users.iter().all(|u| u.get("password_hash").is_none()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_username_is_conflict(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        seed_user(&pool, "bob", "pw", Role::User, None, true).await;
        let server = create_test_server(pool).await;

        let response = server
            .post("/admin/users")
            .add_header("cookie", &cookie)
            .form(&json!({"username": "bob", "password": "password123"}))
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_short_password_is_rejected(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        let server = create_test_server(pool).await;

        let response = server
            .post("/admin/users")
            .add_header("cookie", &cookie)
            .form(&json!({"username": "shorty", "password": "abc"}))
            .await;

        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_disable_then_login_fails(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        let user = seed_user(&pool, "carol", "secret", Role::User, None, true).await;
        let server = create_test_server(pool).await;

        let response = server
            .put(&format!("/admin/users/{}/enabled", user.id))
            .add_header("cookie", &cookie)
            .json(&json!({"enabled": false}))
            .await;
        response.assert_status(axum::http::StatusCode::NO_CONTENT);

        // The flag takes effect on the next login attempt
        let response = server
            .post("/login")
            .form(&json!({"username": "carol", "password": "secret"}))
            .await;
        response.assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_trial_reset_replaces_window(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        let user = seed_user(&pool, "dave", "pw", Role::User, Some(Utc::now() - Duration::days(10)), true).await;
        let server = create_test_server(pool).await;

        let response = server
            .put(&format!("/admin/users/{}/trial", user.id))
            .add_header("cookie", &cookie)
            .json(&json!({"days": 30}))
            .await;
        response.assert_status(axum::http::StatusCode::NO_CONTENT);

        let response = server.get("/admin/users").add_header("cookie", &cookie).await;
        let users: Vec<serde_json::Value> = response.json();
        let dave = users.iter().find(|u| u["username"] == "dave").unwrap();
        // Replaced, not stacked onto the lapsed window
        assert_eq!(dave["trial_days_left"], 30);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_out_of_range_trial_days_are_rejected(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        let user = seed_user(&pool, "greg", "pw", Role::User, None, true).await;
        let server = create_test_server(pool).await;

        let response = server
            .put(&format!("/admin/users/{}/trial", user.id))
            .add_header("cookie", &cookie)
            .json(&json!({"days": i64::MAX}))
            .await;
        response.assert_status_bad_request();

        let response = server
            .post("/admin/users")
            .add_header("cookie", &cookie)
            .form(&json!({"username": "hank", "password": "password123", "trial_days": i64::MAX}))
            .await;
        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        let user = seed_user(&pool, "erin", "pw", Role::User, None, true).await;
        let server = create_test_server(pool).await;

        let response = server
            .delete(&format!("/admin/users/{}", user.id))
            .add_header("cookie", &cookie)
            .await;
        response.assert_status(axum::http::StatusCode::NO_CONTENT);

        // Absent id is a quiet no-op
        let response = server
            .delete(&format!("/admin/users/{}", user.id))
            .add_header("cookie", &cookie)
            .await;
        response.assert_status(axum::http::StatusCode::NO_CONTENT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleted_user_session_is_rejected(pool: SqlitePool) {
        let cookie = admin_cookie(&pool).await;
        let user = seed_user(&pool, "frank", "pw", Role::User, None, true).await;
        let server = create_test_server(pool.clone()).await;

        let user_session = session_cookie("frank");
        server
            .delete(&format!("/admin/users/{}", user.id))
            .add_header("cookie", &cookie)
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);

        // Token is still cryptographically valid but the account is gone
        let response = server.get("/admin/users").add_header("cookie", &user_session).await;
        response.assert_status_unauthorized();
    }
}
