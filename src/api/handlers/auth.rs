use axum::{Form, Json, extract::State};
use chrono::Utc;

use crate::{
    AppState,
    api::models::auth::{ApiAuthRequest, ApiAuthResponse, LoginForm, LoginRedirect, LogoutRedirect},
    auth::gateway,
    errors::Error,
};

/// Browser login with username and password
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    tag = "authentication",
    responses(
        (status = 303, description = "Login successful, session cookie set, redirect to dashboard"),
        (status = 401, description = "Invalid credentials, disabled account or expired trial"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<LoginRedirect, Error> {
    let grant = gateway::interactive_login(&state.db, &state.config, &form.username, &form.password, Utc::now())
        .await?
        .map_err(|failure| Error::Unauthenticated {
            message: Some(failure.user_message().to_string()),
        })?;

    let cookie = create_session_cookie(&grant.token, &state.config);
    Ok(LoginRedirect { cookie })
}

/// Logout (clear session cookie)
#[utoipa::path(
    get,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 303, description = "Session cookie cleared, redirect to login page"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutRedirect {
    // Expired cookie clears the session client-side; the token itself
    // remains valid until it times out.
    let cookie = clear_session_cookie(&state.config);
    LogoutRedirect { cookie }
}

/// Desktop-client authentication check
///
/// Always answers 200; the `ok` flag in the body carries the outcome.
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = ApiAuthRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Auth outcome", body = ApiAuthResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn api_auth(State(state): State<AppState>, Json(request): Json<ApiAuthRequest>) -> Result<Json<ApiAuthResponse>, Error> {
    let response = match gateway::api_login(&state.db, &request.username, &request.password, Utc::now()).await? {
        Ok(grant) => ApiAuthResponse::granted(
            grant.user.username,
            grant.user.profile,
            grant.user.profit_percent,
            grant.trial_remaining_days.days(),
        ),
        Err(failure) => ApiAuthResponse::denied(&failure),
    };

    Ok(Json(response))
}

fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.session;
    let max_age = session_config.timeout.as_secs();

    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_same_site, max_age
    );
    if session_config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie(config: &crate::config::Config) -> String {
    let session_config = &config.auth.session;
    format!(
        "{}=; Path=/; HttpOnly; SameSite={}; Max-Age=0",
        session_config.cookie_name, session_config.cookie_same_site
    )
}
