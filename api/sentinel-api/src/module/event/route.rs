use crate::app::AppState;
use crate::module::event::controller;
use axum::Router;
use axum::routing::get;

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/events",
            get(controller::list_events).post(controller::create_event),
        )
        .route(
            "/api/events/",
            get(controller::list_events).post(controller::create_event),
        )
        .route("/api/events/stats/summary", get(controller::event_stats))
        .route(
            "/api/events/:id",
            get(controller::get_event).put(controller::update_event),
        )
        .route(
            "/api/events/:id/violations",
            get(controller::list_event_violations),
        )
        .with_state(state)
}
