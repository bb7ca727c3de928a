use super::crud;
use super::schema::{PolicyCreate, PolicyListQuery, PolicyUpdate};
use crate::app::AppState;
use crate::module::error::reply;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde_json::Value;

pub async fn list_policies(
    State(state): State<AppState>,
    query: Result<Query<PolicyListQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => crud::list_policies(&state, query),
        Err(rejection) => Err(rejection.into()),
    };
    reply("list policies", result)
}

pub async fn get_policy(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = match id {
        Ok(Path(id)) => crud::get_policy(&state, id),
        Err(rejection) => Err(rejection.into()),
    };
    reply("get policy", result)
}

pub async fn create_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<PolicyCreate>, JsonRejection>,
) -> Response {
    let result = match body {
        Ok(Json(req)) => crud::create_policy(&state, &headers, req),
        Err(rejection) => Err(rejection.into()),
    };
    reply("create policy", result)
}

pub async fn update_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PolicyUpdate>, JsonRejection>,
) -> Response {
    let result = match (id, body) {
        (Ok(Path(id)), Ok(Json(req))) => crud::update_policy(&state, &headers, id, req),
        (Err(rejection), _) => Err(rejection.into()),
        (_, Err(rejection)) => Err(rejection.into()),
    };
    reply("update policy", result)
}

pub async fn delete_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = match id {
        Ok(Path(id)) => crud::delete_policy(&state, &headers, id),
        Err(rejection) => Err(rejection.into()),
    };
    reply("delete policy", result)
}

pub async fn list_templates(State(state): State<AppState>) -> Response {
    reply("list policy templates", crud::list_templates(&state))
}

pub async fn test_policy(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = match (id, body) {
        (Ok(Path(id)), Ok(Json(sample))) => crud::test_policy(&state, id, sample).await,
        (Err(rejection), _) => Err(rejection.into()),
        (_, Err(rejection)) => Err(rejection.into()),
    };
    reply("test policy", result)
}
