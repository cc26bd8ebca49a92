//! OpenAPI documentation, served interactively at `/docs`.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models::{
    auth::{ApiAuthRequest, ApiAuthResponse, LoginForm},
    users::{AddUserForm, EnabledUpdate, Role, TrialUpdate, UserResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trade Gate API",
        description = "Identity and trial-entitlement gate for the trading dashboard"
    ),
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::api_auth,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::delete_user,
        handlers::users::set_user_enabled,
        handlers::users::set_user_trial,
    ),
    components(schemas(
        LoginForm,
        ApiAuthRequest,
        ApiAuthResponse,
        AddUserForm,
        EnabledUpdate,
        TrialUpdate,
        Role,
        UserResponse,
    )),
    tags(
        (name = "authentication", description = "Login endpoints for the browser and the desktop client"),
        (name = "users", description = "Admin-only account administration"),
    )
)]
pub struct ApiDoc;
