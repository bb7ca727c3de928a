use super::crud;
use super::schema::LoginRequest;
use crate::app::AppState;
use crate::module::common::MessageResponse;
use crate::module::error::{AppError, reply};
use crate::service::auth_service::require_principal;
use axum::extract::State;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Form, Json};
use tracing::info;

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let result = match body {
        Ok(Json(req)) => crud::login(&state, req),
        Err(rejection) => Err(rejection.into()),
    };
    reply("login", result)
}

/// OAuth2 password flow: same credentials, form encoded.
pub async fn token(
    State(state): State<AppState>,
    form: Result<Form<LoginRequest>, FormRejection>,
) -> Response {
    let result = match form {
        Ok(Form(req)) => crud::login(&state, req),
        Err(rejection) => Err(rejection.into()),
    };
    reply("token", result)
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = require_principal(&state, &headers)
        .and_then(|principal| crud::current_user(&state, &principal));
    reply("current user", result)
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Ok(principal) = require_principal(&state, &headers) {
        info!(user_id = principal.user_id, "user logged out");
    }
    reply(
        "logout",
        Ok::<_, AppError>(MessageResponse {
            message: "Successfully logged out".to_string(),
            id: None,
        }),
    )
}
