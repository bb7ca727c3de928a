use crate::module::policy::model::PolicyRecord;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyVerdict {
    pub passed: bool,
    pub confidence_score: f64,
    pub evaluation_time_ms: u64,
    pub violations_detected: u32,
    pub details: String,
}

/// Evaluates a policy against a caller-provided sample. The HTTP contract of
/// `POST /api/policies/{id}/test` depends only on this trait.
#[async_trait]
pub trait PolicyEvaluator: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        policy: &PolicyRecord,
        sample: &Map<String, Value>,
    ) -> Result<PolicyVerdict, String>;
}

/// Returns a fixed verdict. The policy definition is never interpreted.
#[derive(Debug, Default, Clone)]
pub struct MockPolicyEvaluator;

#[async_trait]
impl PolicyEvaluator for MockPolicyEvaluator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn evaluate(
        &self,
        _policy: &PolicyRecord,
        _sample: &Map<String, Value>,
    ) -> Result<PolicyVerdict, String> {
        Ok(PolicyVerdict {
            passed: true,
            confidence_score: 0.85,
            evaluation_time_ms: 150,
            violations_detected: 0,
            details: "Mock evaluation completed successfully; policy definition was not interpreted"
                .to_string(),
        })
    }
}
