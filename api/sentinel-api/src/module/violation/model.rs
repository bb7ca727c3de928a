use super::schema::{ViolationStatus, ViolationType};
use crate::module::common::{Severity, db_json_opt, db_time, db_time_opt};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const VIOLATION_COLUMNS: &str = "id, violation_type, severity, status, title, description, \
    details, confidence_score, legal_advice_score, controversial_topics_score, code_prompt_score, \
    safe_prompt_score, event_id, policy_id, acknowledged_by, acknowledged_date, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViolationRecord {
    pub id: i64,
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub status: ViolationStatus,
    pub title: String,
    pub description: Option<String>,
    pub details: Option<Value>,
    pub confidence_score: f64,
    pub legal_advice_score: Option<f64>,
    pub controversial_topics_score: Option<f64>,
    pub code_prompt_score: Option<f64>,
    pub safe_prompt_score: Option<f64>,
    pub event_id: i64,
    pub policy_id: i64,
    pub acknowledged_by: Option<i64>,
    pub acknowledged_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ViolationRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            violation_type: row.get("violation_type")?,
            severity: row.get("severity")?,
            status: row.get("status")?,
            title: row.get("title")?,
            description: row.get("description")?,
            details: db_json_opt(row, "details")?,
            confidence_score: row.get("confidence_score")?,
            legal_advice_score: row.get("legal_advice_score")?,
            controversial_topics_score: row.get("controversial_topics_score")?,
            code_prompt_score: row.get("code_prompt_score")?,
            safe_prompt_score: row.get("safe_prompt_score")?,
            event_id: row.get("event_id")?,
            policy_id: row.get("policy_id")?,
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
            "policy_id": self.policy_id,
            "title": self.title,
            "violation_type": self.violation_type,
            "severity": self.severity,
            "status": self.status,
            "confidence_score": self.confidence_score,
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
