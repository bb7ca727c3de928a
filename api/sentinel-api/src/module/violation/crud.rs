use super::model::{VIOLATION_COLUMNS, ViolationRecord};
use super::schema::{
    CategoryCount, ViolationCreate, ViolationListQuery, ViolationStats, ViolationStatus,
    ViolationType, ViolationUpdate,
};
use crate::app::AppState;
use crate::module::auth::crud::ensure_user;
use crate::infra::VIOLATIONS_TABLE;
use crate::module::common::{
    Severity, count_rows, json_to_db, lock_db, now_utc, page_bounds, require_non_blank, to_db_time,
};
use crate::module::error::AppError;
use crate::module::event::crud::find_event;
use crate::module::policy::crud::policy_exists;
use crate::service::auth_service::resolve_principal;
use crate::service::notifier_service::{Envelope, NotificationKind};
use crate::service::transition_service::plan_update;
use crate::service::validation_service::{validate_optional_unit_score, validate_unit_score};
use axum::http::HeaderMap;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use tracing::info;

pub fn list_violations(
    state: &AppState,
    query: ViolationListQuery,
) -> Result<Vec<ViolationRecord>, AppError> {
    let (offset, limit) = page_bounds(query.skip, query.limit)?;
    let conn = lock_db(&state.db)?;
    let sql = format!(
        "SELECT {VIOLATION_COLUMNS} FROM violations
         WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR severity = ?2)
         ORDER BY created_at DESC, id DESC
         LIMIT ?3 OFFSET ?4"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![query.status, query.severity, limit, offset],
        ViolationRecord::from_row,
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_violation(state: &AppState, id: i64) -> Result<ViolationRecord, AppError> {
    let conn = lock_db(&state.db)?;
    find_violation(&conn, id)?.ok_or_else(|| violation_not_found(id))
}

/// Ingestion path for detectors reporting a violation against an event.
pub fn create_violation(
    state: &AppState,
    headers: &HeaderMap,
    req: ViolationCreate,
) -> Result<ViolationRecord, AppError> {
    resolve_principal(state, headers)?;
    require_non_blank("title", &req.title)?;
    validate_unit_score("confidence_score", req.confidence_score)?;
    validate_optional_unit_score("legal_advice_score", req.legal_advice_score)?;
    validate_optional_unit_score("controversial_topics_score", req.controversial_topics_score)?;
    validate_optional_unit_score("code_prompt_score", req.code_prompt_score)?;
    validate_optional_unit_score("safe_prompt_score", req.safe_prompt_score)?;
    let details = json_to_db(req.details.as_ref())?;

    let record = {
        let conn = lock_db(&state.db)?;
        if find_event(&conn, req.event_id)?.is_none() {
            return Err(AppError::unprocessable(
                "UNKNOWN_EVENT",
                format!("event {} does not exist", req.event_id),
            ));
        }
        if !policy_exists(&conn, req.policy_id)? {
            return Err(AppError::unprocessable(
                "UNKNOWN_POLICY",
                format!("policy {} does not exist", req.policy_id),
            ));
        }

        conn.execute(
            "INSERT INTO violations (violation_type, severity, status, title, description, details,
                 confidence_score, legal_advice_score, controversial_topics_score,
                 code_prompt_score, safe_prompt_score, event_id, policy_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                req.violation_type,
                req.severity,
                ViolationStatus::Detected,
                req.title.trim(),
                req.description,
                details,
                req.confidence_score,
                req.legal_advice_score,
                req.controversial_topics_score,
                req.code_prompt_score,
                req.safe_prompt_score,
                req.event_id,
                req.policy_id,
                to_db_time(&now_utc()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        find_violation(&conn, id)?.ok_or_else(|| violation_not_found(id))?
    };

    info!(
        id = record.id,
        event_id = record.event_id,
        violation_type = %record.violation_type,
        "violation recorded"
    );
    state
        .notifier
        .publish(Envelope::new(NotificationKind::NewViolation, record.created_payload()));
    Ok(record)
}

pub fn update_violation(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
    req: ViolationUpdate,
) -> Result<ViolationRecord, AppError> {
    let principal = resolve_principal(state, headers)?;

    let record = {
        let conn = lock_db(&state.db)?;
        let current = find_violation(&conn, id)?.ok_or_else(|| violation_not_found(id))?;
        let plan = plan_update(
            current.status,
            current.acknowledged_by,
            req.status,
            req.acknowledged_by,
            principal.as_ref(),
        )?;
        if plan.is_noop() {
            return Ok(current);
        }
        if let Some(user_id) = plan.acknowledged_by {
            ensure_user(&conn, user_id)?;
        }

        conn.execute(
            "UPDATE violations SET
                 status = COALESCE(?1, status),
                 acknowledged_by = COALESCE(?2, acknowledged_by),
                 acknowledged_date = CASE WHEN ?2 IS NULL THEN acknowledged_date ELSE ?3 END,
                 updated_at = ?3
             WHERE id = ?4",
            params![plan.status, plan.acknowledged_by, to_db_time(&now_utc()), id],
        )?;
        find_violation(&conn, id)?.ok_or_else(|| violation_not_found(id))?
    };

    info!(id, status = %record.status, acknowledged_by = ?record.acknowledged_by, "violation updated");
    state.notifier.publish(Envelope::new(
        NotificationKind::ViolationUpdated,
        record.updated_payload(),
    ));
    Ok(record)
}

pub fn violation_stats(state: &AppState) -> Result<ViolationStats, AppError> {
    let conn = lock_db(&state.db)?;
    Ok(ViolationStats {
        total_violations: count_rows(&conn, VIOLATIONS_TABLE)?,
        open_violations: count_open(&conn)?,
        critical_violations: count_by_severity(&conn, Severity::Critical)?,
        high_violations: count_by_severity(&conn, Severity::High)?,
        by_category: category_counts(&conn)?,
    })
}

pub fn violations_for_event(conn: &Connection, event_id: i64) -> Result<Vec<ViolationRecord>, AppError> {
    let sql = format!(
        "SELECT {VIOLATION_COLUMNS} FROM violations WHERE event_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![event_id], ViolationRecord::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Violations in `detected` or `investigating`.
pub fn count_open(conn: &Connection) -> Result<i64, AppError> {
    let [first, second] = ViolationStatus::OPEN;
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM violations WHERE status IN (?1, ?2)",
        params![first, second],
        |row| row.get(0),
    )?)
}

pub fn count_by_severity(conn: &Connection, severity: Severity) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM violations WHERE severity = ?1",
        params![severity],
        |row| row.get(0),
    )?)
}

/// One entry per violation type, zero counts included, in declaration order.
pub fn category_counts(conn: &Connection) -> Result<Vec<CategoryCount>, AppError> {
    let mut stmt =
        conn.prepare("SELECT violation_type, COUNT(*) FROM violations GROUP BY violation_type")?;
    let counts = stmt
        .query_map([], |row| {
            Ok((row.get::<_, ViolationType>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(ViolationType::ALL
        .iter()
        .map(|category| CategoryCount {
            category: *category,
            count: counts.get(category).copied().unwrap_or(0),
        })
        .collect())
}

fn find_violation(conn: &Connection, id: i64) -> Result<Option<ViolationRecord>, AppError> {
    let sql = format!("SELECT {VIOLATION_COLUMNS} FROM violations WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], ViolationRecord::from_row)
        .optional()?)
}

fn violation_not_found(id: i64) -> AppError {
    AppError::not_found("VIOLATION_NOT_FOUND", format!("violation {id} not found"))
}
