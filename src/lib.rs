//! Identity and trial-entitlement gate for the trading dashboard.
//!
//! Serves two clients from one account store: the browser dashboard
//! (form login, signed session cookie) and the desktop trading bot
//! (JSON credential check, no session). Admin sessions manage accounts
//! and trial windows over `/admin/users`.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::str::FromStr;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use bon::Builder;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    api::models::users::Role,
    auth::password,
    db::handlers::{Accounts, Repository},
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
};

pub use config::Config;
pub use types::UserId;

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin account if it doesn't exist.
///
/// Idempotent: an existing account with the configured username is left
/// untouched, passwords included. With no admin password configured the
/// seed is skipped with a warning, so a fresh deployment without one has
/// no admin at all rather than a well-known credential.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(config: &Config, db: &SqlitePool) -> Result<Option<UserId>, anyhow::Error> {
    let Some(admin_password) = config.admin_password.as_deref() else {
        warn!("no admin_password configured, skipping initial admin account");
        return Ok(None);
    };

    let mut conn = db.acquire().await?;
    let mut accounts = Accounts::new(&mut conn);

    if let Some(existing) = accounts.get_by_username(&config.admin_username).await? {
        return Ok(Some(existing.id));
    }

    let password_hash = password::hash_string_with_params(admin_password, Some(config.argon2_params()))?;
    let created = accounts
        .create(&UserCreateDBRequest {
            username: config.admin_username.clone(),
            password_hash,
            role: Role::Admin,
            // Admins are never trial-bound
            trial_until: None,
        })
        .await?;

    info!(username = %created.username, "created initial admin account");
    Ok(Some(created.id))
}

/// Open the SQLite pool, run migrations and seed the admin account.
pub async fn setup_database(config: &Config) -> Result<SqlitePool, anyhow::Error> {
    let options = SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    migrator().run(&pool).await?;
    create_initial_admin_user(config, &pool).await?;

    Ok(pool)
}

/// Build the CORS layer from configuration.
///
/// An empty origin list keeps the permissive default the desktop client
/// relies on; listing origins locks the browser surface down.
pub fn create_cors_layer(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let layer = if config.cors.allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins = config
            .cors
            .allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o))
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::COOKIE])
            .allow_credentials(config.cors.allow_credentials)
    };
    Ok(layer)
}

/// Assemble the full router over the given state.
pub fn build_router(state: AppState) -> Result<Router, anyhow::Error> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", get(api::handlers::auth::logout))
        .route("/api/auth", post(api::handlers::auth::api_auth))
        .route(
            "/admin/users",
            get(api::handlers::users::list_users).post(api::handlers::users::create_user),
        )
        .route("/admin/users/{id}", delete(api::handlers::users::delete_user))
        .route("/admin/users/{id}/enabled", put(api::handlers::users::set_user_enabled))
        .route("/admin/users/{id}/trial", put(api::handlers::users::set_user_trial))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// A fully initialized application, ready to serve.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let pool = setup_database(&config).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Run the server until the shutdown future resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("closing database connections");
        self.pool.close().await;

        Ok(())
    }
}
