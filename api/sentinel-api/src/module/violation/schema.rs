use crate::module::common::{Severity, wire_enum};
use crate::service::transition_service::StatusLadder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    ViolationType {
        DataLeak => "data_leak",
        PromptInjection => "prompt_injection",
        PolicyBreach => "policy_breach",
        ContentViolation => "content_violation",
        SecurityIncident => "security_incident",
        ComplianceViolation => "compliance_violation",
    }
}

wire_enum! {
    ViolationStatus {
        Detected => "detected",
        Investigating => "investigating",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
        FalsePositive => "false_positive",
    }
}

impl ViolationStatus {
    /// Statuses counted as open by the stats endpoints.
    pub const OPEN: [Self; 2] = [Self::Detected, Self::Investigating];
}

impl StatusLadder for ViolationStatus {
    const ACKNOWLEDGED: Self = Self::Acknowledged;

    fn rank(&self) -> u8 {
        match self {
            Self::Detected => 0,
            Self::Investigating => 1,
            Self::Acknowledged => 2,
            Self::Resolved | Self::FalsePositive => 3,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::FalsePositive)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationCreate {
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
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
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationUpdate {
    pub status: Option<ViolationStatus>,
    pub acknowledged_by: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationListQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ViolationStatus>,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: ViolationType,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViolationStats {
    pub total_violations: i64,
    pub open_violations: i64,
    pub critical_violations: i64,
    pub high_violations: i64,
    pub by_category: Vec<CategoryCount>,
}
