use super::model::{POLICY_COLUMNS, PolicyRecord, PolicyTemplateRecord, TEMPLATE_COLUMNS};
use super::schema::{
    PolicyCreate, PolicyListQuery, PolicyStatus, PolicyTemplateView, PolicyTestResponse,
    PolicyUpdate,
};
use crate::app::AppState;
use crate::module::common::{
    MessageResponse, json_to_db, lock_db, now_utc, page_bounds, require_non_blank, to_db_time,
};
use crate::module::error::AppError;
use crate::service::auth_service::resolve_principal;
use axum::http::HeaderMap;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::info;

pub fn list_policies(state: &AppState, query: PolicyListQuery) -> Result<Vec<PolicyRecord>, AppError> {
    let (offset, limit) = page_bounds(query.skip, query.limit)?;
    let conn = lock_db(&state.db)?;
    let sql = format!(
        "SELECT {POLICY_COLUMNS} FROM policies
         WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR category = ?2)
         ORDER BY created_at DESC, id DESC
         LIMIT ?3 OFFSET ?4"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![query.status, query.category, limit, offset],
        PolicyRecord::from_row,
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_policy(state: &AppState, id: i64) -> Result<PolicyRecord, AppError> {
    let conn = lock_db(&state.db)?;
    find_policy(&conn, id)?.ok_or_else(|| policy_not_found(id))
}

pub fn create_policy(
    state: &AppState,
    headers: &HeaderMap,
    req: PolicyCreate,
) -> Result<PolicyRecord, AppError> {
    let principal = resolve_principal(state, headers)?;
    require_non_blank("name", &req.name)?;
    require_non_blank("definition", &req.definition)?;
    let config = json_to_db(req.intervention_config.as_ref())?;

    let conn = lock_db(&state.db)?;
    conn.execute(
        "INSERT INTO policies (name, definition, category, status, severity, performance_mode,
             intervention_type, intervention_config, estimated_cost_per_event,
             estimated_latency_ms, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            req.name,
            req.definition,
            req.category,
            PolicyStatus::Draft,
            req.severity,
            req.performance_mode,
            req.intervention_type,
            config,
            req.performance_mode.estimated_cost_per_event(),
            req.performance_mode.estimated_latency_ms(),
            principal.map(|p| p.user_id),
            to_db_time(&now_utc()),
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(policy_id = id, category = %req.category, "policy created");
    find_policy(&conn, id)?.ok_or_else(|| policy_not_found(id))
}

pub fn update_policy(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
    req: PolicyUpdate,
) -> Result<PolicyRecord, AppError> {
    resolve_principal(state, headers)?;
    let conn = lock_db(&state.db)?;
    let mut policy = find_policy(&conn, id)?.ok_or_else(|| policy_not_found(id))?;

    if let Some(name) = req.name {
        require_non_blank("name", &name)?;
        policy.name = name;
    }
    if let Some(definition) = req.definition {
        require_non_blank("definition", &definition)?;
        policy.definition = definition;
    }
    if let Some(category) = req.category {
        policy.category = category;
    }
    if let Some(status) = req.status {
        policy.status = status;
    }
    if let Some(severity) = req.severity {
        policy.severity = severity;
    }
    if let Some(mode) = req.performance_mode {
        policy.performance_mode = mode;
        policy.estimated_cost_per_event = mode.estimated_cost_per_event();
        policy.estimated_latency_ms = mode.estimated_latency_ms();
    }
    if let Some(intervention) = req.intervention_type {
        policy.intervention_type = intervention;
    }
    if let Some(config) = req.intervention_config {
        policy.intervention_config = config;
    }

    conn.execute(
        "UPDATE policies SET name = ?1, definition = ?2, category = ?3, status = ?4,
             severity = ?5, performance_mode = ?6, intervention_type = ?7,
             intervention_config = ?8, estimated_cost_per_event = ?9,
             estimated_latency_ms = ?10, updated_at = ?11
         WHERE id = ?12",
        params![
            policy.name,
            policy.definition,
            policy.category,
            policy.status,
            policy.severity,
            policy.performance_mode,
            policy.intervention_type,
            json_to_db(policy.intervention_config.as_ref())?,
            policy.estimated_cost_per_event,
            policy.estimated_latency_ms,
            to_db_time(&now_utc()),
            id,
        ],
    )?;
    info!(policy_id = id, status = %policy.status, "policy updated");
    find_policy(&conn, id)?.ok_or_else(|| policy_not_found(id))
}

/// Removes the policy row only. Events and violations that reference it
/// keep their `policy_id`.
pub fn delete_policy(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
) -> Result<MessageResponse, AppError> {
    resolve_principal(state, headers)?;
    let conn = lock_db(&state.db)?;
    let removed = conn.execute("DELETE FROM policies WHERE id = ?1", params![id])?;
    if removed == 0 {
        return Err(policy_not_found(id));
    }
    info!(policy_id = id, "policy deleted");
    Ok(MessageResponse {
        message: "Policy deleted successfully".to_string(),
        id: Some(id),
    })
}

pub fn list_templates(state: &AppState) -> Result<Vec<PolicyTemplateView>, AppError> {
    let conn = lock_db(&state.db)?;
    let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM policy_templates WHERE is_active = 1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], PolicyTemplateRecord::from_row)?;
    Ok(rows
        .collect::<rusqlite::Result<Vec<_>>>()?
        .into_iter()
        .map(|t| PolicyTemplateView {
            tags: t.tag_list(),
            id: t.id,
            name: t.name,
            category: t.category,
            description: t.description,
            template_code: t.template_code,
            default_severity: t.default_severity,
            default_performance_mode: t.default_performance_mode,
            is_active: t.is_active,
        })
        .collect())
}

pub async fn test_policy(state: &AppState, id: i64, sample: Value) -> Result<PolicyTestResponse, AppError> {
    let Value::Object(sample) = sample else {
        return Err(AppError::unprocessable(
            "INVALID_SAMPLE",
            "test sample must be a JSON object",
        ));
    };
    let policy = get_policy(state, id)?;

    let evaluator = state.evaluator.clone();
    let verdict = evaluator
        .evaluate(&policy, &sample)
        .await
        .map_err(|e| AppError::internal("POLICY_EVALUATION_FAILED", e))?;
    info!(
        policy_id = id,
        evaluator = evaluator.name(),
        passed = verdict.passed,
        "policy evaluated"
    );
    Ok(PolicyTestResponse {
        policy_id: id,
        evaluator: evaluator.name().to_string(),
        test_passed: verdict.passed,
        confidence_score: verdict.confidence_score,
        evaluation_time_ms: verdict.evaluation_time_ms,
        violations_detected: verdict.violations_detected,
        details: verdict.details,
    })
}

pub fn find_policy(conn: &Connection, id: i64) -> Result<Option<PolicyRecord>, AppError> {
    let sql = format!("SELECT {POLICY_COLUMNS} FROM policies WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], PolicyRecord::from_row)
        .optional()?)
}

pub fn policy_exists(conn: &Connection, id: i64) -> Result<bool, AppError> {
    Ok(conn
        .query_row("SELECT 1 FROM policies WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn policy_not_found(id: i64) -> AppError {
    AppError::not_found("POLICY_NOT_FOUND", format!("policy {id} not found"))
}
