//! Shared helpers for integration tests.

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    AppState,
    api::models::users::Role,
    auth::{password::Argon2Params, session},
    db::{handlers::Accounts, handlers::Repository, models::users::UserCreateDBRequest, models::users::UserDBResponse},
};

pub fn create_test_config() -> crate::config::Config {
    let mut config = crate::config::Config::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.secret_key = Some("test-secret-key-for-testing-only".to_string());
    // Cheap argon2 so tests don't burn CPU on hashing
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config.auth.password.argon2_parallelism = 1;
    config
}

pub async fn create_test_server(pool: SqlitePool) -> TestServer {
    let state = AppState::builder().db(pool).config(create_test_config()).build();
    let router = crate::build_router(state).expect("failed to build router");
    TestServer::new(router).expect("failed to create test server")
}

fn test_hash(password: &str) -> String {
    let params = Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    crate::auth::password::hash_string_with_params(password, Some(params)).expect("failed to hash test password")
}

/// Insert an account directly, bypassing the HTTP surface.
pub async fn seed_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    role: Role,
    trial_until: Option<DateTime<Utc>>,
    enabled: bool,
) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("failed to acquire connection");
    let mut accounts = Accounts::new(&mut conn);
    let user = accounts
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            password_hash: test_hash(password),
            role,
            trial_until,
        })
        .await
        .expect("failed to seed test user");

    if !enabled {
        accounts.set_enabled(user.id, false).await.expect("failed to disable test user");
    }

    let mut user = user;
    user.enabled = enabled;
    user
}

/// A cookie header value carrying a fresh session token for `username`.
///
/// The token is signed with the same config [`create_test_server`] uses, so
/// it verifies against any server built from these helpers.
pub fn session_cookie(username: &str) -> String {
    let config = create_test_config();
    let token = session::issue_session_token(username, Utc::now(), &config).expect("failed to issue test token");
    format!("{}={}", config.auth.session.cookie_name, token)
}

/// Seed the admin account and return a cookie header for it.
pub async fn admin_cookie(pool: &SqlitePool) -> String {
    seed_user(pool, "admin", "admin-password", Role::Admin, None, true).await;
    session_cookie("admin")
}
