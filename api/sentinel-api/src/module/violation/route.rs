use crate::app::AppState;
use crate::module::violation::controller;
use axum::Router;
use axum::routing::get;

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/violations",
            get(controller::list_violations).post(controller::create_violation),
        )
        .route(
            "/api/violations/",
            get(controller::list_violations).post(controller::create_violation),
        )
        .route("/api/violations/stats/summary", get(controller::violation_stats))
        .route(
            "/api/violations/:id",
            get(controller::get_violation).put(controller::update_violation),
        )
        .with_state(state)
}
