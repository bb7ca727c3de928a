use crate::app::AppState;
use crate::module::dashboard::controller;
use axum::Router;
use axum::routing::get;

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard/stats", get(controller::dashboard_stats))
        .route("/api/dashboard/events/timeline", get(controller::events_timeline))
        .route("/api/dashboard/recent-activity", get(controller::recent_activity))
        .route(
            "/api/dashboard/performance-metrics",
            get(controller::performance_metrics),
        )
        .route(
            "/api/dashboard/violations/by-category",
            get(controller::violations_by_category),
        )
        .route(
            "/api/dashboard/policies/by-status",
            get(controller::policies_by_status),
        )
        .with_state(state)
}
