use crate::app::AppState;
use crate::module::realtime::controller;
use axum::Router;
use axum::routing::get;

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/events/ws", get(controller::subscribe))
        .with_state(state)
}
