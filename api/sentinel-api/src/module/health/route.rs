use crate::app::AppState;
use crate::module::health::controller;
use axum::Router;
use axum::routing::get;

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(controller::root))
        .route("/health", get(controller::health))
        .with_state(state)
}
