#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode};
use sentinel_api::app::{AppState, build_router};
use sentinel_api::config::environment::AppConfig;
use sentinel_api::infra::Database;
use sentinel_api::module::auth::crud::insert_user;
use sentinel_api::module::auth::schema::UserRole;
use sentinel_api::service::password_service::hash_password;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        database_path: ":memory:".to_string(),
        redis_url: None,
        realtime_channel: "sentinel:test".to_string(),
        cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        jwt_secret: TEST_SECRET.to_string(),
        access_token_ttl_minutes: 30,
        require_auth: false,
        seed_on_startup: false,
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let db = Arc::new(Database::open_in_memory().expect("open in-memory database"));
        let state = AppState::new(config, db, None);
        Self {
            app: build_router(state.clone()),
            state,
        }
    }

    pub fn add_user(&self, username: &str, role: UserRole) -> i64 {
        let conn = self.state.db.lock().expect("db lock");
        let hashed = hash_password("secret").expect("hash password");
        insert_user(&conn, username, &format!("{username}@sentinelai.ai"), &hashed, role)
            .expect("insert user")
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("serialize body"))),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self.app.clone().oneshot(request).await.expect("request failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json response")
        };
        (status, payload)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None, None).await
    }

    pub async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                json!({"username": username, "password": "secret"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().expect("token").to_string()
    }

    pub async fn create_policy(&self, name: &str) -> Value {
        let (status, body) = self.post("/api/policies", policy_body(name)).await;
        assert_eq!(status, StatusCode::OK, "create policy failed: {body}");
        body
    }

    pub async fn create_event(&self, event_id: &str, extra: Value) -> Value {
        let mut body = json!({
            "event_id": event_id,
            "event_type": "llm_request",
            "title": format!("Event {event_id}"),
        });
        merge(&mut body, extra);
        let (status, body) = self.post("/api/events", body).await;
        assert_eq!(status, StatusCode::OK, "create event failed: {body}");
        body
    }

    pub async fn create_violation(&self, event_id: i64, policy_id: i64, extra: Value) -> Value {
        let mut body = json!({
            "violation_type": "data_leak",
            "severity": "high",
            "title": "Sensitive data in completion",
            "confidence_score": 0.9,
            "event_id": event_id,
            "policy_id": policy_id,
        });
        merge(&mut body, extra);
        let (status, body) = self.post("/api/violations", body).await;
        assert_eq!(status, StatusCode::OK, "create violation failed: {body}");
        body
    }

    pub fn count(&self, table: &str) -> i64 {
        let conn = self.state.db.lock().expect("db lock");
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count rows")
    }
}

pub fn policy_body(name: &str) -> Value {
    json!({
        "name": name,
        "definition": "response.completion has sentinelai.data_leakage and scope.app is DataApp",
        "category": "privacy",
    })
}

pub fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().expect("id field")
}

fn merge(base: &mut Value, extra: Value) {
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
}
