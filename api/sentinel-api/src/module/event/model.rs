use super::schema::{EventStatus, EventType};
use crate::module::common::{Severity, db_json_opt, db_time, db_time_opt};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const EVENT_COLUMNS: &str = "id, event_id, event_type, severity, status, title, description, \
    event_data, model_name, request_tokens, response_tokens, completion_reason, request_temperature, \
    request_max_tokens, trigger_date, duration_ms, policy_id, user_id, acknowledged_by, \
    acknowledged_date, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub status: EventStatus,
    pub title: String,
    pub description: Option<String>,
    pub event_data: Option<Value>,
    pub model_name: Option<String>,
    pub request_tokens: Option<i64>,
    pub response_tokens: Option<i64>,
    pub completion_reason: Option<String>,
    pub request_temperature: Option<f64>,
    pub request_max_tokens: Option<i64>,
    pub trigger_date: DateTime<Utc>,
    pub duration_ms: Option<f64>,
    pub policy_id: Option<i64>,
    pub user_id: Option<i64>,
    pub acknowledged_by: Option<i64>,
    pub acknowledged_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            event_id: row.get("event_id")?,
            event_type: row.get("event_type")?,
            severity: row.get("severity")?,
            status: row.get("status")?,
            title: row.get("title")?,
            description: row.get("description")?,
            event_data: db_json_opt(row, "event_data")?,
            model_name: row.get("model_name")?,
            request_tokens: row.get("request_tokens")?,
            response_tokens: row.get("response_tokens")?,
            completion_reason: row.get("completion_reason")?,
            request_temperature: row.get("request_temperature")?,
            request_max_tokens: row.get("request_max_tokens")?,
            trigger_date: db_time(row, "trigger_date")?,
            duration_ms: row.get("duration_ms")?,
            policy_id: row.get("policy_id")?,
            user_id: row.get("user_id")?,
            acknowledged_by: row.get("acknowledged_by")?,
            acknowledged_date: db_time_opt(row, "acknowledged_date")?,
            created_at: db_time(row, "created_at")?,
            updated_at: db_time_opt(row, "updated_at")?,
        })
    }

    pub fn created_payload(&self) -> Value {
        json!({
            "id": self.id,
            "event_id": self.event_id,
            "title": self.title,
            "severity": self.severity,
            "status": self.status,
            "trigger_date": self.trigger_date,
        })
    }

    pub fn updated_payload(&self) -> Value {
        json!({
            "id": self.id,
            "status": self.status,
            "acknowledged_by": self.acknowledged_by,
            "acknowledged_date": self.acknowledged_date,
        })
    }
}
