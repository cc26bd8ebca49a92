//! Wire models for the login endpoints.
//!
//! `/api/auth` keeps the legacy field names (`user`, `perfil`, `lucro`) the
//! deployed desktop client sends and expects; renaming them is a breaking
//! protocol change.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::gateway::AuthFailure;

/// Browser login form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// JSON body of `/api/auth`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiAuthRequest {
    #[serde(rename = "user")]
    pub username: String,
    pub password: String,
}

/// JSON reply of `/api/auth`. Always delivered with HTTP 200; the `ok`
/// flag carries the outcome, as the desktop client expects.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ApiAuthResponse {
    Granted {
        ok: bool,
        user: String,
        #[serde(rename = "perfil")]
        profile: String,
        #[serde(rename = "lucro")]
        profit_percent: f64,
        /// `null` means the account has no trial bound at all.
        trial_remaining_days: Option<i64>,
    },
    Denied {
        ok: bool,
        reason: String,
    },
}

impl ApiAuthResponse {
    pub fn granted(
        user: String,
        profile: String,
        profit_percent: f64,
        trial_remaining_days: Option<i64>,
    ) -> Self {
        Self::Granted {
            ok: true,
            user,
            profile,
            profit_percent,
            trial_remaining_days,
        }
    }

    pub fn denied(failure: &AuthFailure) -> Self {
        Self::Denied {
            ok: false,
            reason: failure.reason_code().to_string(),
        }
    }
}

/// Successful interactive login: set the session cookie and send the
/// browser to the dashboard.
#[derive(Debug)]
pub struct LoginRedirect {
    pub cookie: String,
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        (
            StatusCode::SEE_OTHER,
            [
                (header::SET_COOKIE, self.cookie),
                (header::LOCATION, "/dashboard".to_string()),
            ],
        )
            .into_response()
    }
}

/// Logout: clear the cookie client-side and return to the login page.
/// The token itself stays valid until natural expiry (stateless codec).
#[derive(Debug)]
pub struct LogoutRedirect {
    pub cookie: String,
}

impl IntoResponse for LogoutRedirect {
    fn into_response(self) -> Response {
        (
            StatusCode::SEE_OTHER,
            [
                (header::SET_COOKIE, self.cookie),
                (header::LOCATION, "/".to_string()),
            ],
        )
            .into_response()
    }
}
