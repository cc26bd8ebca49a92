//! Login entry points.
//!
//! Both clients funnel through [`verify_credentials`]; the two entry points
//! then deliberately diverge:
//!
//! - [`interactive_login`] (browser) enforces the trial window for
//!   non-admins, records login bookkeeping and issues a session token.
//! - [`api_login`] (desktop/bot client) checks credentials only - no trial
//!   enforcement, no bookkeeping, no token. This divergence is inherited
//!   from the deployed system and preserved pending product clarification;
//!   do not unify the paths silently.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::{
    auth::{password, session, trial, trial::TrialDays},
    config::Config,
    db::{errors::DbError, handlers::Accounts, models::users::UserDBResponse},
    errors::{Error, Result},
};

/// Why a login attempt was denied.
///
/// The checks run in a fixed order (existence, enabled flag, password,
/// then trial for the interactive path) and short-circuit on the first
/// failure, so these reasons are observable and part of the contract.
/// Note the reasons do distinguish unknown users from wrong passwords -
/// an enumeration leak kept for client compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    UserNotFound,
    Disabled,
    InvalidPassword,
    TrialExpired,
}

impl AuthFailure {
    /// Stable machine-readable reason code for the JSON surface.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuthFailure::UserNotFound => "user_not_found",
            AuthFailure::Disabled => "disabled",
            AuthFailure::InvalidPassword => "invalid_password",
            AuthFailure::TrialExpired => "trial_expired",
        }
    }

    /// Human-readable message for the interactive login page.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthFailure::UserNotFound => "User not found.",
            AuthFailure::Disabled => "Account is disabled.",
            AuthFailure::InvalidPassword => "Incorrect password.",
            AuthFailure::TrialExpired => "Trial period has expired.",
        }
    }
}

/// The auth decision: infrastructure failures travel in the outer
/// [`Result`], denials in the inner one.
pub type AuthOutcome<T> = std::result::Result<T, AuthFailure>;

/// A granted interactive session.
#[derive(Debug)]
pub struct SessionGrant {
    pub user: UserDBResponse,
    pub token: String,
    pub cookie_max_age: std::time::Duration,
}

/// A granted API authentication (no session is created).
#[derive(Debug)]
pub struct ApiGrant {
    pub user: UserDBResponse,
    pub trial_remaining_days: TrialDays,
}

/// Check a username/password pair against the account store.
///
/// Order matters: existence, then enabled flag, then password.
#[instrument(skip(db, password), err)]
pub async fn verify_credentials(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<AuthOutcome<UserDBResponse>> {
    let mut conn = db.acquire().await.map_err(DbError::from)?;
    let mut accounts = Accounts::new(&mut conn);

    let Some(user) = accounts.get_by_username(username).await? else {
        return Ok(Err(AuthFailure::UserNotFound));
    };

    if !user.enabled {
        return Ok(Err(AuthFailure::Disabled));
    }

    // Argon2 verification takes tens of milliseconds by design; keep it off
    // the async runtime.
    let supplied = password.to_string();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&supplied, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Ok(Err(AuthFailure::InvalidPassword));
    }

    Ok(Ok(user))
}

/// Browser login: credentials, trial window, bookkeeping, session token.
#[instrument(skip(db, config, password), err)]
pub async fn interactive_login(
    db: &SqlitePool,
    config: &Config,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<AuthOutcome<SessionGrant>> {
    let user = match verify_credentials(db, username, password).await? {
        Ok(user) => user,
        Err(failure) => return Ok(Err(failure)),
    };

    if trial::is_expired(user.trial_until, now, user.role) {
        return Ok(Err(AuthFailure::TrialExpired));
    }

    {
        let mut conn = db.acquire().await.map_err(DbError::from)?;
        Accounts::new(&mut conn).record_login(&user.username, now).await?;
    }

    let token = session::issue_session_token(&user.username, now, config)?;
    info!(username = %user.username, "interactive login succeeded");

    Ok(Ok(SessionGrant {
        user,
        token,
        cookie_max_age: config.auth.session.timeout,
    }))
}

/// Desktop-client login: credentials only.
///
/// Deliberately skips trial enforcement and login bookkeeping and issues
/// no token; an expired trial reports as granted with zero remaining days.
#[instrument(skip(db, password), err)]
pub async fn api_login(
    db: &SqlitePool,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<AuthOutcome<ApiGrant>> {
    let user = match verify_credentials(db, username, password).await? {
        Ok(user) => user,
        Err(failure) => return Ok(Err(failure)),
    };

    let trial_remaining_days = trial::remaining_days(user.trial_until, now);

    Ok(Ok(ApiGrant {
        user,
        trial_remaining_days,
    }))
}
