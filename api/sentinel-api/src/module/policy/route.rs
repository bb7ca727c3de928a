use crate::app::AppState;
use crate::module::policy::controller;
use axum::Router;
use axum::routing::{get, post};

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/policies",
            get(controller::list_policies).post(controller::create_policy),
        )
        .route(
            "/api/policies/",
            get(controller::list_policies).post(controller::create_policy),
        )
        .route("/api/policies/templates", get(controller::list_templates))
        .route("/api/policies/templates/", get(controller::list_templates))
        .route(
            "/api/policies/:id",
            get(controller::get_policy)
                .put(controller::update_policy)
                .delete(controller::delete_policy),
        )
        .route("/api/policies/:id/test", post(controller::test_policy))
        .with_state(state)
}
