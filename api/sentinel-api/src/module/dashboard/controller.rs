use super::crud;
use super::schema::{RecentActivityQuery, TimelineQuery};
use crate::app::AppState;
use crate::module::error::reply;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;

pub async fn dashboard_stats(State(state): State<AppState>) -> Response {
    reply("dashboard stats", crud::dashboard_stats(&state))
}

pub async fn events_timeline(
    State(state): State<AppState>,
    query: Result<Query<TimelineQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => crud::events_timeline(&state, query),
        Err(rejection) => Err(rejection.into()),
    };
    reply("events timeline", result)
}

pub async fn recent_activity(
    State(state): State<AppState>,
    query: Result<Query<RecentActivityQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => crud::recent_activity(&state, query),
        Err(rejection) => Err(rejection.into()),
    };
    reply("recent activity", result)
}

pub async fn performance_metrics(State(state): State<AppState>) -> Response {
    reply("performance metrics", crud::performance_metrics(&state))
}

pub async fn violations_by_category(State(state): State<AppState>) -> Response {
    reply("violations by category", crud::violations_by_category(&state))
}

pub async fn policies_by_status(State(state): State<AppState>) -> Response {
    reply("policies by status", crud::policies_by_status(&state))
}
