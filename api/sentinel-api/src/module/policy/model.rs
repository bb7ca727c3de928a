use super::schema::{InterventionType, PerformanceMode, PolicyCategory, PolicyStatus};
use crate::module::common::{Severity, db_json_opt, db_time, db_time_opt};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const POLICY_COLUMNS: &str = "id, name, definition, category, status, severity, performance_mode, \
    intervention_type, intervention_config, estimated_cost_per_event, estimated_latency_ms, \
    created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyRecord {
    pub id: i64,
    pub name: String,
    pub definition: String,
    pub category: PolicyCategory,
    pub status: PolicyStatus,
    pub severity: Severity,
    pub performance_mode: PerformanceMode,
    pub intervention_type: InterventionType,
    pub intervention_config: Option<Value>,
    pub estimated_cost_per_event: f64,
    pub estimated_latency_ms: f64,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PolicyRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            definition: row.get("definition")?,
            category: row.get("category")?,
            status: row.get("status")?,
            severity: row.get("severity")?,
            performance_mode: row.get("performance_mode")?,
            intervention_type: row.get("intervention_type")?,
            intervention_config: db_json_opt(row, "intervention_config")?,
            estimated_cost_per_event: row.get("estimated_cost_per_event")?,
            estimated_latency_ms: row.get("estimated_latency_ms")?,
            created_by: row.get("created_by")?,
            created_at: db_time(row, "created_at")?,
            updated_at: db_time_opt(row, "updated_at")?,
        })
    }
}

pub const TEMPLATE_COLUMNS: &str = "id, name, category, description, template_code, default_severity, \
    default_performance_mode, tags, is_active";

#[derive(Debug, Clone)]
pub struct PolicyTemplateRecord {
    pub id: i64,
    pub name: String,
    pub category: PolicyCategory,
    pub description: String,
    pub template_code: String,
    pub default_severity: Severity,
    pub default_performance_mode: PerformanceMode,
    pub tags: Option<String>,
    pub is_active: bool,
}

impl PolicyTemplateRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: row.get("category")?,
            description: row.get("description")?,
            template_code: row.get("template_code")?,
            default_severity: row.get("default_severity")?,
            default_performance_mode: row.get("default_performance_mode")?,
            tags: row.get("tags")?,
            is_active: row.get("is_active")?,
        })
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}
