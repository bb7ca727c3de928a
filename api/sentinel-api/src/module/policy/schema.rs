use crate::module::common::{Severity, deserialize_nullable, wire_enum};
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    PolicyCategory {
        DataSecurity => "data_security",
        Privacy => "privacy",
        Compliance => "compliance",
        Governance => "governance",
        IncidentDetection => "incident_detection",
        ContentFiltering => "content_filtering",
    }
}

wire_enum! {
    PolicyStatus {
        Draft => "draft",
        Open => "open",
        Acknowledged => "acknowledged",
        Closed => "closed",
    }
}

wire_enum! {
    PerformanceMode {
        Fast => "fast",
        Balanced => "balanced",
        Robust => "robust",
    }
}

wire_enum! {
    InterventionType {
        Notification => "notification",
        Block => "block",
        Redact => "redact",
    }
}

const BASE_COST_PER_EVENT: f64 = 240.0;

impl PerformanceMode {
    pub fn estimated_cost_per_event(&self) -> f64 {
        let multiplier = match self {
            Self::Fast => 0.5,
            Self::Balanced => 1.0,
            Self::Robust => 2.0,
        };
        BASE_COST_PER_EVENT * multiplier
    }

    pub fn estimated_latency_ms(&self) -> f64 {
        match self {
            Self::Fast => 50.0,
            Self::Balanced => 100.0,
            Self::Robust => 200.0,
        }
    }
}

fn default_severity() -> Severity {
    Severity::Medium
}

fn default_performance_mode() -> PerformanceMode {
    PerformanceMode::Balanced
}

fn default_intervention_type() -> InterventionType {
    InterventionType::Notification
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyCreate {
    pub name: String,
    pub definition: String,
    pub category: PolicyCategory,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default = "default_performance_mode")]
    pub performance_mode: PerformanceMode,
    #[serde(default = "default_intervention_type")]
    pub intervention_type: InterventionType,
    #[serde(default)]
    pub intervention_config: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyUpdate {
    pub name: Option<String>,
    pub definition: Option<String>,
    pub category: Option<PolicyCategory>,
    pub status: Option<PolicyStatus>,
    pub severity: Option<Severity>,
    pub performance_mode: Option<PerformanceMode>,
    pub intervention_type: Option<InterventionType>,
    /// `null` clears the stored config.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub intervention_config: Option<Option<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<PolicyStatus>,
    pub category: Option<PolicyCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTemplateView {
    pub id: i64,
    pub name: String,
    pub category: PolicyCategory,
    pub description: String,
    pub template_code: String,
    pub default_severity: Severity,
    pub default_performance_mode: PerformanceMode,
    pub tags: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTestResponse {
    pub policy_id: i64,
    pub evaluator: String,
    pub test_passed: bool,
    pub confidence_score: f64,
    pub evaluation_time_ms: u64,
    pub violations_detected: u32,
    pub details: String,
}
