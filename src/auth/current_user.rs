use crate::{
    api::models::users::CurrentUser,
    auth::session,
    db::{errors::DbError, handlers::Accounts},
    errors::{Error, Result},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tracing::{debug, instrument};

/// Extract the session token from the request's cookie header, if any.
///
/// Walks every cookie with the configured name so a stale duplicate from
/// an older deployment does not shadow a fresh one.
#[instrument(skip(parts, config))]
fn try_session_cookie_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<String>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    let now = Utc::now();
    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, now, config) {
                    Ok(subject) => return Some(Ok(subject)),
                    Err(_) => {
                        // Expired/invalid tokens are routine, keep scanning
                        continue;
                    }
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let subject = match try_session_cookie_auth(parts, &state.config) {
            Some(Ok(subject)) => subject,
            Some(Err(e)) => return Err(e),
            None => {
                debug!("no valid session cookie on request");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        // The token is only a claim to a username; the account itself must
        // still exist (it may have been deleted since issuance).
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let user = Accounts::new(&mut conn)
            .get_by_username(&subject)
            .await?
            .ok_or(Error::Unauthenticated { message: None })?;

        Ok(CurrentUser::from(user))
    }
}

/// A [`CurrentUser`] that has been checked for the admin role.
///
/// Handlers that mutate accounts take this instead of `CurrentUser` so the
/// role check cannot be forgotten.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(Error::InsufficientPermissions {
                resource: "account administration".to_string(),
            });
        }
        Ok(AdminUser(user))
    }
}
