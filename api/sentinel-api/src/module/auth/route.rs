use crate::app::AppState;
use crate::module::auth::controller;
use axum::Router;
use axum::routing::{get, post};

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(controller::login))
        .route("/api/auth/token", post(controller::token))
        .route("/api/auth/me", get(controller::me))
        .route("/api/auth/logout", post(controller::logout))
        .with_state(state)
}
