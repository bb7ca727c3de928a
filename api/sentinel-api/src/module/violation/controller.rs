use super::crud;
use super::schema::{ViolationCreate, ViolationListQuery, ViolationUpdate};
use crate::app::AppState;
use crate::module::error::reply;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;

pub async fn list_violations(
    State(state): State<AppState>,
    query: Result<Query<ViolationListQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => crud::list_violations(&state, query),
        Err(rejection) => Err(rejection.into()),
    };
    reply("list violations", result)
}

pub async fn get_violation(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = match id {
        Ok(Path(id)) => crud::get_violation(&state, id),
        Err(rejection) => Err(rejection.into()),
    };
    reply("get violation", result)
}

pub async fn create_violation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ViolationCreate>, JsonRejection>,
) -> Response {
    let result = match body {
        Ok(Json(req)) => crud::create_violation(&state, &headers, req),
        Err(rejection) => Err(rejection.into()),
    };
    reply("create violation", result)
}

pub async fn update_violation(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ViolationUpdate>, JsonRejection>,
) -> Response {
    let result = match (id, body) {
        (Ok(Path(id)), Ok(Json(req))) => crud::update_violation(&state, &headers, id, req),
        (Err(rejection), _) => Err(rejection.into()),
        (_, Err(rejection)) => Err(rejection.into()),
    };
    reply("update violation", result)
}

pub async fn violation_stats(State(state): State<AppState>) -> Response {
    reply("violation stats", crud::violation_stats(&state))
}
