use crate::module::common::{Severity, SeverityBreakdown};
use crate::module::policy::schema::{PerformanceMode, PolicyStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMELINE_DAYS: u32 = 7;
pub const MAX_TIMELINE_DAYS: u32 = 365;
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;
pub const MAX_ACTIVITY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_policies: i64,
    pub active_policies: i64,
    pub total_events: i64,
    pub open_violations: i64,
    pub events_last_24h: i64,
    pub critical_violations: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineBucket {
    pub date: String,
    pub total: i64,
    pub severity_breakdown: SeverityBreakdown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentActivityQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Event,
    Violation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub id: i64,
    pub title: String,
    pub severity: Severity,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModePerformance {
    pub mode: PerformanceMode,
    pub avg_latency_ms: f64,
    pub avg_cost_per_event: f64,
    pub policy_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    pub avg_event_duration_ms: f64,
    pub policy_performance: Vec<ModePerformance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: PolicyStatus,
    pub count: i64,
}
