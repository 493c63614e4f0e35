use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, patch},
};

use carshop_auth::RegisterUser;
use carshop_core::Login;

use crate::app::dto::{self, UserResponse};
use crate::app::errors;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Authenticated account routes. Registration is mounted publicly in
/// [`crate::app::router_with`].
pub fn router() -> Router {
    Router::new()
        .route("/api/user/:login/change-password", patch(change_password))
        .route("/api/user/:login/block", delete(block_user))
        .route("/api/user/:login/restore", patch(restore_user))
}

fn parse_login(raw: String) -> Result<Login, axum::response::Response> {
    Login::parse(raw).map_err(errors::domain_error_to_response)
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<dto::RegisterUserRequest>,
) -> axum::response::Response {
    let cmd = match RegisterUser::try_from(body) {
        Ok(cmd) => cmd,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.users.register(cmd).await {
        Ok(user) => (StatusCode::CREATED, Json(UserResponse::from(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Only the account holder may change their own password.
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(login): Path<String>,
    JsonBody(body): JsonBody<dto::ChangePasswordRequest>,
) -> axum::response::Response {
    let login = match parse_login(login) {
        Ok(login) => login,
        Err(resp) => return resp,
    };
    if principal.login() != &login {
        return errors::json_error(
            StatusCode::FORBIDDEN,
            "unauthorized",
            "cannot change another user's password",
        );
    }
    match services.users.change_password(&login, body.into()).await {
        Ok(user) => Json(UserResponse::from(&user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn block_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(login): Path<String>,
) -> axum::response::Response {
    let login = match parse_login(login) {
        Ok(login) => login,
        Err(resp) => return resp,
    };
    match services.users.block(&login).await {
        Ok(user) => Json(UserResponse::from(&user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn restore_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(login): Path<String>,
) -> axum::response::Response {
    let login = match parse_login(login) {
        Ok(login) => login,
        Err(resp) => return resp,
    };
    match services.users.restore(&login).await {
        Ok(user) => Json(UserResponse::from(&user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
