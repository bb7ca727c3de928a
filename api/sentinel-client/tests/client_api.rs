use sentinel_client::client::ApiClient;
use sentinel_client::error::ClientError;
use sentinel_client::token_store::TokenStore;
use sentinel_client::types::ListQuery;
use sentinel_client::views::{DashboardPoller, EventView, Filter, PolicyView, ViolationView};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STAMP: &str = "2026-10-01T12:00:00Z";

fn policy_json(id: i64, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "definition": format!("response.completion has sentinelai.rule_{id}"),
        "category": "privacy",
        "status": status,
        "severity": "medium",
        "performance_mode": "balanced",
        "intervention_type": "notification",
        "intervention_config": null,
        "estimated_cost_per_event": 240.0,
        "estimated_latency_ms": 100.0,
        "created_by": 1,
        "created_at": STAMP,
        "updated_at": null
    })
}

fn event_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "event_id": format!("evt_{id:04}"),
        "event_type": "policy_violation",
        "severity": "high",
        "status": status,
        "title": format!("Event {id}"),
        "description": null,
        "trigger_date": STAMP,
        "created_at": STAMP
    })
}

fn violation_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "violation_type": "data_leak",
        "severity": "critical",
        "status": status,
        "title": format!("Violation {id}"),
        "confidence_score": 0.9,
        "event_id": 1,
        "policy_id": 1,
        "created_at": STAMP
    })
}

fn user_json() -> Value {
    json!({
        "id": 7,
        "username": "jimmy.sanchez",
        "email": "jimmy@sentinelai.ai",
        "role": "analyst",
        "created_at": STAMP
    })
}

async fn logged_in(server: &MockServer) -> ApiClient {
    let tokens = TokenStore::memory();
    tokens.save("tok-1").expect("save token");
    ApiClient::new(server.uri(), tokens)
}

#[tokio::test]
async fn login_stores_token_and_later_requests_carry_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({"username": "admin"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-abc",
            "token_type": "bearer",
            "expires_at": 1_900_000_000
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri(), TokenStore::memory());
    client.login("admin", "secret").await.expect("login");
    assert_eq!(
        client.tokens().load().expect("load").as_deref(),
        Some("tok-abc")
    );
    let me = client.me().await.expect("me");
    assert_eq!(me.username, "jimmy.sanchez");
}

#[tokio::test]
async fn unauthorized_response_clears_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error_code": "INVALID_TOKEN",
            "detail": "token expired"
        })))
        .mount(&server)
        .await;

    let client = logged_in(&server).await;
    let err = client.me().await.expect_err("401");
    assert!(matches!(err, ClientError::Unauthorized));
    assert_eq!(client.tokens().load().expect("load"), None);
}

#[tokio::test]
async fn error_statuses_map_to_typed_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_code": "EVENT_NOT_FOUND",
            "detail": "Event not found"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/violations/3"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error_code": "INVALID_TRANSITION",
            "detail": "cannot move from resolved to detected"
        })))
        .mount(&server)
        .await;

    let client = logged_in(&server).await;
    let missing = client.get_event(999).await.expect_err("404");
    assert!(matches!(missing, ClientError::NotFound(ref d) if d == "Event not found"));

    let change = sentinel_client::types::StatusChange {
        status: Some("detected".to_string()),
        acknowledged_by: None,
    };
    let rejected = client
        .update_violation(3, &change)
        .await
        .expect_err("422");
    assert!(
        matches!(rejected, ClientError::Validation { ref code, .. } if code == "INVALID_TRANSITION")
    );
    assert_eq!(
        client.tokens().load().expect("load").as_deref(),
        Some("tok-1")
    );
}

#[tokio::test]
async fn list_sends_pagination_and_view_filters_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/policies"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            policy_json(2, "Data Leakage Prevention Policy", "open"),
            policy_json(1, "CSR Compliance Policy", "draft"),
        ])))
        .mount(&server)
        .await;

    let mut view = PolicyView::new(logged_in(&server).await);
    view.query = ListQuery {
        limit: Some(2),
        ..ListQuery::default()
    };
    view.refresh().await.expect("refresh");
    assert_eq!(view.list.items.len(), 2);

    view.list.filter = Filter {
        search: Some("leakage".to_string()),
        ..Filter::default()
    };
    let visible = view.list.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, 2);

    view.list.filter = Filter {
        status: Some("draft".to_string()),
        ..Filter::default()
    };
    assert_eq!(view.list.visible()[0].id, 1);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/violations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([violation_json(1, "detected")])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/violations"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error_code": "DATABASE_ERROR",
            "detail": "internal error"
        })))
        .mount(&server)
        .await;

    let mut view = ViolationView::new(logged_in(&server).await);
    view.refresh().await.expect("first refresh");
    let err = view.refresh().await.expect_err("second refresh");
    assert!(matches!(err, ClientError::Server { status: 500, .. }));
    assert_eq!(view.list.items.len(), 1);
    assert!(view.list.error.is_some());
    assert!(!view.list.loading);
}

#[tokio::test]
async fn acknowledge_sends_acknowledger_then_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/events/5"))
        .and(body_partial_json(json!({"status": "acknowledged", "acknowledged_by": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json(5, "acknowledged")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event_json(5, "acknowledged")])))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = EventView::new(logged_in(&server).await);
    let event = view.acknowledge(5, 7).await.expect("acknowledge");
    assert_eq!(event.status, "acknowledged");
    assert_eq!(view.list.items[0].status, "acknowledged");
}

#[tokio::test]
async fn toggle_flips_open_policy_to_draft() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/policies/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json(4, "P", "open")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/policies/4"))
        .and(body_partial_json(json!({"status": "draft"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json(4, "P", "draft")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([policy_json(4, "P", "draft")])))
        .mount(&server)
        .await;

    let mut view = PolicyView::new(logged_in(&server).await);
    let policy = view.toggle_status(4).await.expect("toggle");
    assert_eq!(policy.status, "draft");
}

#[tokio::test]
async fn dashboard_poller_publishes_snapshots_until_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_policies": 10,
            "active_policies": 7,
            "total_events": 50,
            "open_violations": 8,
            "events_last_24h": 2,
            "critical_violations": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/events/timeline"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/recent-activity"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let poller = DashboardPoller::with_period(logged_in(&server).await, Duration::from_millis(20));
    let mut snapshots = poller.snapshots();
    tokio::time::timeout(Duration::from_secs(5), snapshots.changed())
        .await
        .expect("snapshot in time")
        .expect("poller alive");
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.stats.total_policies, 10);
    assert!(snapshot.error.is_none());
    assert!(poller.is_running());

    poller.stop();
    tokio::time::timeout(Duration::from_secs(5), async {
        while snapshots.changed().await.is_ok() {}
    })
    .await
    .expect("sender dropped after stop");
}
