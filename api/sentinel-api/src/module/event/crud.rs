use super::model::{EVENT_COLUMNS, EventRecord};
use super::schema::{
    EventCreate, EventListQuery, EventStats, EventStatus, EventStatusBreakdown, EventUpdate,
};
use crate::app::AppState;
use crate::module::auth::crud::ensure_user;
use crate::infra::EVENTS_TABLE;
use crate::module::common::{
    Severity, SeverityBreakdown, count_rows, json_to_db, lock_db, now_utc, page_bounds, require_non_blank,
    to_db_time,
};
use crate::module::error::AppError;
use crate::module::policy::crud::policy_exists;
use crate::module::violation::crud::violations_for_event;
use crate::module::violation::model::ViolationRecord;
use crate::service::auth_service::resolve_principal;
use crate::service::notifier_service::{Envelope, NotificationKind};
use crate::service::transition_service::plan_update;
use crate::service::validation_service::validate_non_negative;
use axum::http::HeaderMap;
use chrono::Duration;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

pub fn list_events(state: &AppState, query: EventListQuery) -> Result<Vec<EventRecord>, AppError> {
    let (offset, limit) = page_bounds(query.skip, query.limit)?;
    let conn = lock_db(&state.db)?;
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE (?1 IS NULL OR status = ?1)
           AND (?2 IS NULL OR severity = ?2)
           AND (?3 IS NULL OR policy_id = ?3)
         ORDER BY trigger_date DESC, id DESC
         LIMIT ?4 OFFSET ?5"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![query.status, query.severity, query.policy_id, limit, offset],
        EventRecord::from_row,
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_event(state: &AppState, id: i64) -> Result<EventRecord, AppError> {
    let conn = lock_db(&state.db)?;
    find_event(&conn, id)?.ok_or_else(|| event_not_found(id))
}

pub fn create_event(
    state: &AppState,
    headers: &HeaderMap,
    req: EventCreate,
) -> Result<EventRecord, AppError> {
    resolve_principal(state, headers)?;
    require_non_blank("event_id", &req.event_id)?;
    require_non_blank("title", &req.title)?;
    validate_non_negative("duration_ms", req.duration_ms)?;
    let event_data = json_to_db(req.event_data.as_ref())?;
    let event_id = req.event_id.trim();

    let record = {
        let conn = lock_db(&state.db)?;
        if let Some(policy_id) = req.policy_id {
            if !policy_exists(&conn, policy_id)? {
                return Err(AppError::unprocessable(
                    "UNKNOWN_POLICY",
                    format!("policy {policy_id} does not exist"),
                ));
            }
        }
        if let Some(user_id) = req.user_id {
            ensure_user(&conn, user_id)?;
        }
        if event_id_taken(&conn, event_id)? {
            return Err(AppError::conflict(
                "DUPLICATE_EVENT_ID",
                format!("event_id {event_id} already exists"),
            ));
        }

        let now = now_utc();
        let trigger_date = req.trigger_date.unwrap_or(now);
        conn.execute(
            "INSERT INTO events (event_id, event_type, severity, status, title, description,
                 event_data, model_name, request_tokens, response_tokens, completion_reason,
                 request_temperature, request_max_tokens, trigger_date, duration_ms, policy_id,
                 user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                event_id,
                req.event_type,
                req.severity,
                EventStatus::Open,
                req.title.trim(),
                req.description,
                event_data,
                req.model_name,
                req.request_tokens,
                req.response_tokens,
                req.completion_reason,
                req.request_temperature,
                req.request_max_tokens,
                to_db_time(&trigger_date),
                req.duration_ms,
                req.policy_id,
                req.user_id,
                to_db_time(&now),
            ],
        )?;
        let id = conn.last_insert_rowid();
        find_event(&conn, id)?.ok_or_else(|| event_not_found(id))?
    };

    info!(id = record.id, event_id = %record.event_id, severity = %record.severity, "event created");
    state
        .notifier
        .publish(Envelope::new(NotificationKind::NewEvent, record.created_payload()));
    Ok(record)
}

pub fn update_event(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
    req: EventUpdate,
) -> Result<EventRecord, AppError> {
    let principal = resolve_principal(state, headers)?;

    let record = {
        let conn = lock_db(&state.db)?;
        let current = find_event(&conn, id)?.ok_or_else(|| event_not_found(id))?;
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
            "UPDATE events SET
                 status = COALESCE(?1, status),
                 acknowledged_by = COALESCE(?2, acknowledged_by),
                 acknowledged_date = CASE WHEN ?2 IS NULL THEN acknowledged_date ELSE ?3 END,
                 updated_at = ?3
             WHERE id = ?4",
            params![plan.status, plan.acknowledged_by, to_db_time(&now_utc()), id],
        )?;
        find_event(&conn, id)?.ok_or_else(|| event_not_found(id))?
    };

    info!(id, status = %record.status, acknowledged_by = ?record.acknowledged_by, "event updated");
    state
        .notifier
        .publish(Envelope::new(NotificationKind::EventUpdated, record.updated_payload()));
    Ok(record)
}

pub fn list_event_violations(state: &AppState, id: i64) -> Result<Vec<ViolationRecord>, AppError> {
    let conn = lock_db(&state.db)?;
    if find_event(&conn, id)?.is_none() {
        return Err(event_not_found(id));
    }
    violations_for_event(&conn, id)
}

pub fn event_stats(state: &AppState) -> Result<EventStats, AppError> {
    let conn = lock_db(&state.db)?;
    let since = to_db_time(&(now_utc() - Duration::hours(24)));

    let total_events = count_rows(&conn, EVENTS_TABLE)?;
    let events_last_24h: i64 = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE trigger_date >= ?1",
        params![since],
        |row| row.get(0),
    )?;

    let mut by_severity = SeverityBreakdown::default();
    let mut stmt = conn.prepare("SELECT severity, COUNT(*) FROM events GROUP BY severity")?;
    for row in stmt.query_map([], |row| Ok((row.get::<_, Severity>(0)?, row.get::<_, i64>(1)?)))? {
        let (severity, count) = row?;
        by_severity.add(severity, count);
    }

    let mut by_status = EventStatusBreakdown::default();
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM events GROUP BY status")?;
    for row in stmt.query_map([], |row| Ok((row.get::<_, EventStatus>(0)?, row.get::<_, i64>(1)?)))? {
        let (status, count) = row?;
        by_status.add(status, count);
    }

    Ok(EventStats {
        total_events,
        open_events: by_status.open,
        events_last_24h,
        critical_events: by_severity.critical,
        by_severity,
        by_status,
    })
}

pub fn find_event(conn: &Connection, id: i64) -> Result<Option<EventRecord>, AppError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], EventRecord::from_row)
        .optional()?)
}

fn event_id_taken(conn: &Connection, event_id: &str) -> Result<bool, AppError> {
    Ok(conn
        .query_row("SELECT 1 FROM events WHERE event_id = ?1", params![event_id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn event_not_found(id: i64) -> AppError {
    AppError::not_found("EVENT_NOT_FOUND", format!("event {id} not found"))
}
