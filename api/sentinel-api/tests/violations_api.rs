mod common;

use common::{TestApp, id_of};
use http::StatusCode;
use sentinel_api::module::auth::schema::UserRole;
use serde_json::{Value, json};

async fn event_and_policy(t: &TestApp) -> (i64, i64) {
    let policy_id = id_of(&t.create_policy("Prompt Injection Prevention Policy").await);
    let event_id = id_of(
        &t.create_event("evt_base", json!({"policy_id": policy_id}))
            .await,
    );
    (event_id, policy_id)
}

#[tokio::test]
async fn created_violation_starts_detected_and_round_trips() {
    let t = TestApp::new();
    let (event_id, policy_id) = event_and_policy(&t).await;
    let violation = t
        .create_violation(
            event_id,
            policy_id,
            json!({"legal_advice_score": 0.2, "details": {"matched": "ssn"}}),
        )
        .await;
    assert_eq!(violation["status"], "detected");
    assert_eq!(violation["confidence_score"], 0.9);
    assert_eq!(violation["details"]["matched"], "ssn");

    let (status, fetched) = t.get(&format!("/api/violations/{}", id_of(&violation))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, violation);
}

#[tokio::test]
async fn scores_outside_unit_interval_are_rejected() {
    let t = TestApp::new();
    let (event_id, policy_id) = event_and_policy(&t).await;

    for (field, value) in [
        ("confidence_score", 1.5),
        ("confidence_score", -0.01),
        ("code_prompt_score", 2.0),
        ("safe_prompt_score", -1.0),
    ] {
        let mut body = json!({
            "violation_type": "prompt_injection",
            "severity": "critical",
            "title": "Injection attempt",
            "event_id": event_id,
            "policy_id": policy_id,
        });
        body[field] = json!(value);
        let (status, err) = t.post("/api/violations", body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error_code"], "SCORE_OUT_OF_RANGE");
        assert!(err["detail"].as_str().unwrap_or_default().contains(field));
    }
    assert_eq!(t.count("violations"), 0);
}

#[tokio::test]
async fn references_must_exist() {
    let t = TestApp::new();
    let (event_id, policy_id) = event_and_policy(&t).await;
    let base = json!({
        "violation_type": "policy_breach",
        "severity": "low",
        "title": "Breach",
    });

    let mut unknown_event = base.clone();
    unknown_event["event_id"] = json!(event_id + 100);
    unknown_event["policy_id"] = json!(policy_id);
    let (status, err) = t.post("/api/violations", unknown_event).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error_code"], "UNKNOWN_EVENT");

    let mut unknown_policy = base;
    unknown_policy["event_id"] = json!(event_id);
    unknown_policy["policy_id"] = json!(policy_id + 100);
    let (status, err) = t.post("/api/violations", unknown_policy).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error_code"], "UNKNOWN_POLICY");
    assert_eq!(t.count("violations"), 0);
}

#[tokio::test]
async fn list_filters_intersect_and_page_newest_first() {
    let t = TestApp::new();
    let admin = t.add_user("admin", UserRole::Admin);
    let (event_id, policy_id) = event_and_policy(&t).await;
    let high_detected = t.create_violation(event_id, policy_id, json!({})).await;
    let low_detected = t
        .create_violation(event_id, policy_id, json!({"severity": "low"}))
        .await;
    let high_acked = t.create_violation(event_id, policy_id, json!({})).await;
    t.put(
        &format!("/api/violations/{}", id_of(&high_acked)),
        json!({"status": "acknowledged", "acknowledged_by": admin}),
    )
    .await;

    let (_, list) = t.get("/api/violations?status=detected&severity=high").await;
    let ids: Vec<i64> = list.as_array().expect("array").iter().map(id_of).collect();
    assert_eq!(ids, vec![id_of(&high_detected)]);

    let (_, page) = t.get("/api/violations?skip=1&limit=1").await;
    let ids: Vec<i64> = page.as_array().expect("array").iter().map(id_of).collect();
    assert_eq!(ids, vec![id_of(&low_detected)]);
}

#[tokio::test]
async fn acknowledge_flow_records_who_and_when() {
    let t = TestApp::new();
    let admin = t.add_user("admin", UserRole::Admin);
    let (event_id, policy_id) = event_and_policy(&t).await;
    let id = id_of(&t.create_violation(event_id, policy_id, json!({})).await);
    let uri = format!("/api/violations/{id}");

    let (status, acked) = t
        .put(&uri, json!({"status": "acknowledged", "acknowledged_by": admin}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked["acknowledged_by"], admin);
    let acked_at = acked["acknowledged_date"].clone();
    assert!(acked_at.is_string());

    let (status, again) = t
        .put(&uri, json!({"status": "acknowledged", "acknowledged_by": admin}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, acked);

    let (status, err) = t.put(&uri, json!({"status": "detected"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error_code"], "INVALID_STATUS_TRANSITION");

    let (status, resolved) = t.put(&uri, json!({"status": "resolved"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "resolved");
    assert_eq!(resolved["acknowledged_date"], acked_at);
}

#[tokio::test]
async fn false_positive_is_terminal() {
    let t = TestApp::new();
    let (event_id, policy_id) = event_and_policy(&t).await;
    let id = id_of(&t.create_violation(event_id, policy_id, json!({})).await);
    let uri = format!("/api/violations/{id}");

    let (status, _) = t.put(&uri, json!({"status": "false_positive"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, err) = t.put(&uri, json!({"status": "resolved"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error_code"], "INVALID_STATUS_TRANSITION");
}

#[tokio::test]
async fn stats_summary_counts_open_and_categories() {
    let t = TestApp::new();
    let admin = t.add_user("admin", UserRole::Admin);
    let (event_id, policy_id) = event_and_policy(&t).await;
    t.create_violation(event_id, policy_id, json!({"severity": "critical"})).await;
    t.create_violation(event_id, policy_id, json!({"violation_type": "prompt_injection"}))
        .await;
    let acked = t.create_violation(event_id, policy_id, json!({})).await;
    t.put(
        &format!("/api/violations/{}", id_of(&acked)),
        json!({"status": "investigating"}),
    )
    .await;
    let done = t.create_violation(event_id, policy_id, json!({})).await;
    t.put(
        &format!("/api/violations/{}", id_of(&done)),
        json!({"status": "acknowledged", "acknowledged_by": admin}),
    )
    .await;

    let (status, stats) = t.get("/api/violations/stats/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_violations"], 4);
    assert_eq!(stats["open_violations"], 3);
    assert_eq!(stats["critical_violations"], 1);
    assert_eq!(stats["high_violations"], 3);

    let by_category = stats["by_category"].as_array().expect("array");
    assert_eq!(by_category.len(), 6);
    let count_of = |category: &str| {
        by_category
            .iter()
            .find(|c| c["category"] == category)
            .map(|c| c["count"].clone())
            .unwrap_or(Value::Null)
    };
    assert_eq!(count_of("data_leak"), 3);
    assert_eq!(count_of("prompt_injection"), 1);
    assert_eq!(count_of("security_incident"), 0);
}

#[tokio::test]
async fn deleting_a_policy_keeps_its_violations() {
    let t = TestApp::new();
    let (event_id, policy_id) = event_and_policy(&t).await;
    let violation = t.create_violation(event_id, policy_id, json!({})).await;

    let (status, _) = t.delete(&format!("/api/policies/{policy_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, kept) = t.get(&format!("/api/violations/{}", id_of(&violation))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["policy_id"], policy_id);
    let (_, event) = t.get(&format!("/api/events/{event_id}")).await;
    assert_eq!(event["policy_id"], policy_id);
}

#[tokio::test]
async fn acknowledger_cannot_be_rewritten_outside_acknowledged() {
    let t = TestApp::new();
    let admin = t.add_user("admin", UserRole::Admin);
    let analyst = t.add_user("jimmy.sanchez", UserRole::Analyst);
    let (event_id, policy_id) = event_and_policy(&t).await;
    let id = id_of(&t.create_violation(event_id, policy_id, json!({})).await);
    let uri = format!("/api/violations/{id}");

    let (status, err) = t.put(&uri, json!({"acknowledged_by": admin})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error_code"], "INVALID_STATUS_TRANSITION");
    let (_, still) = t.get(&uri).await;
    assert_eq!(still["status"], "detected");
    assert!(still["acknowledged_by"].is_null());

    t.put(&uri, json!({"status": "acknowledged", "acknowledged_by": admin}))
        .await;
    let (status, resolved) = t.put(&uri, json!({"status": "resolved"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = t.put(&uri, json!({"acknowledged_by": analyst})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error_code"], "INVALID_STATUS_TRANSITION");
    let (_, after) = t.get(&uri).await;
    assert_eq!(after, resolved);
    assert_eq!(after["acknowledged_by"], admin);
}
