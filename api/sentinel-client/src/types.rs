//! Wire shapes as the client sees them. Enumerations stay plain strings so a
//! newer server value never breaks decoding on an older client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: i64,
    pub name: String,
    pub definition: String,
    pub category: String,
    pub status: String,
    pub severity: String,
    pub performance_mode: String,
    pub intervention_type: String,
    #[serde(default)]
    pub intervention_config: Option<Value>,
    pub estimated_cost_per_event: f64,
    pub estimated_latency_ms: f64,
    #[serde(default)]
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTemplate {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub template_code: String,
    pub default_severity: String,
    pub default_performance_mode: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTestResult {
    pub policy_id: i64,
    pub evaluator: String,
    pub test_passed: bool,
    pub confidence_score: f64,
    pub evaluation_time_ms: u64,
    pub violations_detected: u32,
    pub details: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPolicy {
    pub name: String,
    pub definition: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_config: Option<Value>,
}

/// Partial policy edit; only the populated fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub severity: String,
    pub status: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_data: Option<Value>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub request_tokens: Option<i64>,
    #[serde(default)]
    pub response_tokens: Option<i64>,
    pub trigger_date: DateTime<Utc>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub policy_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub acknowledged_by: Option<i64>,
    #[serde(default)]
    pub acknowledged_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: i64,
    pub violation_type: String,
    pub severity: String,
    pub status: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    pub confidence_score: f64,
    #[serde(default)]
    pub legal_advice_score: Option<f64>,
    #[serde(default)]
    pub controversial_topics_score: Option<f64>,
    #[serde(default)]
    pub code_prompt_score: Option<f64>,
    #[serde(default)]
    pub safe_prompt_score: Option<f64>,
    pub event_id: i64,
    pub policy_id: i64,
    #[serde(default)]
    pub acknowledged_by: Option<i64>,
    #[serde(default)]
    pub acknowledged_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for the event and violation update endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub critical: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub total_events: i64,
    pub open_events: i64,
    pub events_last_24h: i64,
    pub critical_events: i64,
    pub by_severity: SeverityBreakdown,
    pub by_status: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationStats {
    pub total_violations: i64,
    pub open_violations: i64,
    pub critical_violations: i64,
    pub high_violations: i64,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_policies: i64,
    pub active_policies: i64,
    pub total_events: i64,
    pub open_violations: i64,
    pub events_last_24h: i64,
    pub critical_violations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub date: String,
    pub total: i64,
    pub severity_breakdown: SeverityBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    pub title: String,
    pub severity: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModePerformance {
    pub mode: String,
    pub avg_latency_ms: f64,
    pub avg_cost_per_event: f64,
    pub policy_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_event_duration_ms: f64,
    pub policy_performance: Vec<ModePerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub database_available: bool,
    pub realtime_clients: usize,
}

/// Query string shared by the three list endpoints. Fields a given endpoint
/// does not understand are ignored server side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<i64>,
}

/// Server error body: `{"error_code": "...", "detail": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub detail: String,
}
