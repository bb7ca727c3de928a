use super::crud;
use super::schema::{EventCreate, EventListQuery, EventUpdate};
use crate::app::AppState;
use crate::module::error::reply;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;

pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventListQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => crud::list_events(&state, query),
        Err(rejection) => Err(rejection.into()),
    };
    reply("list events", result)
}

pub async fn get_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = match id {
        Ok(Path(id)) => crud::get_event(&state, id),
        Err(rejection) => Err(rejection.into()),
    };
    reply("get event", result)
}

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<EventCreate>, JsonRejection>,
) -> Response {
    let result = match body {
        Ok(Json(req)) => crud::create_event(&state, &headers, req),
        Err(rejection) => Err(rejection.into()),
    };
    reply("create event", result)
}

pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<EventUpdate>, JsonRejection>,
) -> Response {
    let result = match (id, body) {
        (Ok(Path(id)), Ok(Json(req))) => crud::update_event(&state, &headers, id, req),
        (Err(rejection), _) => Err(rejection.into()),
        (_, Err(rejection)) => Err(rejection.into()),
    };
    reply("update event", result)
}

pub async fn list_event_violations(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = match id {
        Ok(Path(id)) => crud::list_event_violations(&state, id),
        Err(rejection) => Err(rejection.into()),
    };
    reply("list event violations", result)
}

pub async fn event_stats(State(state): State<AppState>) -> Response {
    reply("event stats", crud::event_stats(&state))
}
