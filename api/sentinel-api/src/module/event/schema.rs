use crate::module::common::{Severity, SeverityBreakdown, deserialize_wire_time_opt, wire_enum};
use crate::service::transition_service::StatusLadder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    EventType {
        LlmRequest => "llm_request",
        LlmResponse => "llm_response",
        PolicyViolation => "policy_violation",
        Intervention => "intervention",
        SystemEvent => "system_event",
    }
}

wire_enum! {
    EventStatus {
        Open => "open",
        Investigating => "investigating",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
        Closed => "closed",
    }
}

impl StatusLadder for EventStatus {
    const ACKNOWLEDGED: Self = Self::Acknowledged;

    fn rank(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Investigating => 1,
            Self::Acknowledged => 2,
            Self::Resolved => 3,
            Self::Closed => 4,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

fn default_event_severity() -> Severity {
    Severity::Low
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCreate {
    pub event_id: String,
    pub event_type: EventType,
    #[serde(default = "default_event_severity")]
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_data: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_wire_time_opt")]
    pub trigger_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub request_tokens: Option<i64>,
    #[serde(default)]
    pub response_tokens: Option<i64>,
    #[serde(default)]
    pub completion_reason: Option<String>,
    #[serde(default)]
    pub request_temperature: Option<f64>,
    #[serde(default)]
    pub request_max_tokens: Option<i64>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub policy_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    pub status: Option<EventStatus>,
    pub acknowledged_by: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<EventStatus>,
    pub severity: Option<Severity>,
    pub policy_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventStatusBreakdown {
    pub open: i64,
    pub investigating: i64,
    pub acknowledged: i64,
    pub resolved: i64,
    pub closed: i64,
}

impl EventStatusBreakdown {
    pub fn add(&mut self, status: EventStatus, count: i64) {
        match status {
            EventStatus::Open => self.open += count,
            EventStatus::Investigating => self.investigating += count,
            EventStatus::Acknowledged => self.acknowledged += count,
            EventStatus::Resolved => self.resolved += count,
            EventStatus::Closed => self.closed += count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventStats {
    pub total_events: i64,
    pub open_events: i64,
    pub events_last_24h: i64,
    pub critical_events: i64,
    pub by_severity: SeverityBreakdown,
    pub by_status: EventStatusBreakdown,
}
