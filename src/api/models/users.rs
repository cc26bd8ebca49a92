//! API request/response models for account administration.

use crate::auth::trial;
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Admins bypass trial enforcement everywhere and are the
/// only sessions accepted by the mutation endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Form payload for creating an account.
///
/// Matches the dashboard's add-user form; a missing `trial_days` falls back
/// to the configured default.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddUserForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub trial_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnabledUpdate {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrialUpdate {
    pub days: i64,
}

/// One row of the admin account listing.
///
/// The password hash never leaves the db layer; `trial_days_left` is
/// computed at response time (`null` = no trial bound).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub enabled: bool,
    pub profile: String,
    pub profit_percent: f64,
    pub role: Role,
    pub trial_until: Option<DateTime<Utc>>,
    pub trial_days_left: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: i64,
}

impl UserResponse {
    pub fn from_db(user: UserDBResponse, now: DateTime<Utc>) -> Self {
        let trial_days_left = trial::remaining_days(user.trial_until, now).days();
        Self {
            id: user.id,
            username: user.username,
            enabled: user.enabled,
            profile: user.profile,
            profit_percent: user.profit_percent,
            role: user.role,
            trial_until: user.trial_until,
            trial_days_left,
            created_at: user.created_at,
            last_login: user.last_login,
            login_count: user.login_count,
        }
    }
}

/// The authenticated account behind a session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            role: db.role,
        }
    }
}
