//! Aggregates behind the dashboard. Everything is computed per request.

use super::schema::{
    ActivityItem, ActivityKind, DEFAULT_ACTIVITY_LIMIT, DEFAULT_TIMELINE_DAYS, DashboardStats,
    MAX_ACTIVITY_LIMIT, MAX_TIMELINE_DAYS, ModePerformance, PerformanceMetrics,
    RecentActivityQuery, StatusCount, TimelineBucket, TimelineQuery,
};
use crate::app::AppState;
use crate::infra::{EVENTS_TABLE, POLICIES_TABLE};
use crate::module::common::{
    Severity, SeverityBreakdown, count_rows, db_time, lock_db, now_utc, to_db_time,
};
use crate::module::error::AppError;
use crate::module::policy::schema::{PerformanceMode, PolicyStatus};
use crate::module::violation::crud::{category_counts, count_by_severity, count_open};
use crate::module::violation::schema::CategoryCount;
use chrono::{Duration, NaiveDate};
use rusqlite::params;
use std::collections::{BTreeMap, HashMap};

pub fn dashboard_stats(state: &AppState) -> Result<DashboardStats, AppError> {
    let conn = lock_db(&state.db)?;
    let since = to_db_time(&(now_utc() - Duration::hours(24)));
    Ok(DashboardStats {
        total_policies: count_rows(&conn, POLICIES_TABLE)?,
        active_policies: conn.query_row(
            "SELECT COUNT(*) FROM policies WHERE status = ?1",
            params![PolicyStatus::Open],
            |row| row.get(0),
        )?,
        total_events: count_rows(&conn, EVENTS_TABLE)?,
        open_violations: count_open(&conn)?,
        events_last_24h: conn.query_row(
            "SELECT COUNT(*) FROM events WHERE trigger_date >= ?1",
            params![since],
            |row| row.get(0),
        )?,
        critical_violations: count_by_severity(&conn, Severity::Critical)?,
    })
}

/// Dense per-day event counts for the last `days` days, oldest first, ending
/// today (UTC).
pub fn events_timeline(state: &AppState, query: TimelineQuery) -> Result<Vec<TimelineBucket>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_TIMELINE_DAYS);
    if !(1..=MAX_TIMELINE_DAYS).contains(&days) {
        return Err(AppError::unprocessable(
            "INVALID_DAYS",
            format!("days must be between 1 and {MAX_TIMELINE_DAYS}"),
        ));
    }
    let today = now_utc().date_naive();
    let first_day = today - Duration::days(i64::from(days) - 1);

    let mut buckets: BTreeMap<NaiveDate, TimelineBucket> = first_day
        .iter_days()
        .take(days as usize)
        .map(|day| {
            (
                day,
                TimelineBucket {
                    date: day.format("%Y-%m-%d").to_string(),
                    total: 0,
                    severity_breakdown: SeverityBreakdown::default(),
                },
            )
        })
        .collect();

    let conn = lock_db(&state.db)?;
    let mut stmt = conn.prepare(
        "SELECT substr(trigger_date, 1, 10) AS day, severity, COUNT(*) FROM events
         WHERE trigger_date >= ?1
         GROUP BY day, severity",
    )?;
    let rows = stmt.query_map(params![first_day.format("%Y-%m-%d").to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Severity>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;
    for row in rows {
        let (day, severity, count) = row?;
        let Ok(day) = NaiveDate::parse_from_str(&day, "%Y-%m-%d") else {
            continue;
        };
        if let Some(bucket) = buckets.get_mut(&day) {
            bucket.total += count;
            bucket.severity_breakdown.add(severity, count);
        }
    }
    Ok(buckets.into_values().collect())
}

/// Latest events and violations merged by timestamp, newest first.
pub fn recent_activity(
    state: &AppState,
    query: RecentActivityQuery,
) -> Result<Vec<ActivityItem>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    if !(1..=MAX_ACTIVITY_LIMIT).contains(&limit) {
        return Err(AppError::unprocessable(
            "INVALID_LIMIT",
            format!("limit must be between 1 and {MAX_ACTIVITY_LIMIT}"),
        ));
    }

    let conn = lock_db(&state.db)?;
    let mut items = Vec::with_capacity(limit as usize * 2);

    let mut stmt = conn.prepare(
        "SELECT id, title, severity, status, trigger_date FROM events
         ORDER BY trigger_date DESC, id DESC LIMIT ?1",
    )?;
    let events = stmt.query_map(params![limit], |row| {
        Ok(ActivityItem {
            kind: ActivityKind::Event,
            id: row.get("id")?,
            title: row.get("title")?,
            severity: row.get("severity")?,
            status: row.get("status")?,
            timestamp: db_time(row, "trigger_date")?,
        })
    })?;
    for item in events {
        items.push(item?);
    }

    let mut stmt = conn.prepare(
        "SELECT id, title, severity, status, created_at FROM violations
         ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let violations = stmt.query_map(params![limit], |row| {
        Ok(ActivityItem {
            kind: ActivityKind::Violation,
            id: row.get("id")?,
            title: row.get("title")?,
            severity: row.get("severity")?,
            status: row.get("status")?,
            timestamp: db_time(row, "created_at")?,
        })
    })?;
    for item in violations {
        items.push(item?);
    }

    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items.truncate(limit as usize);
    Ok(items)
}

pub fn performance_metrics(state: &AppState) -> Result<PerformanceMetrics, AppError> {
    let conn = lock_db(&state.db)?;
    let avg_duration: Option<f64> =
        conn.query_row("SELECT AVG(duration_ms) FROM events", [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT performance_mode, AVG(estimated_latency_ms), AVG(estimated_cost_per_event), COUNT(*)
         FROM policies GROUP BY performance_mode",
    )?;
    let mut by_mode = stmt
        .query_map([], |row| {
            Ok(ModePerformance {
                mode: row.get(0)?,
                avg_latency_ms: round_to(row.get::<_, Option<f64>>(1)?.unwrap_or(0.0), 2),
                avg_cost_per_event: round_to(row.get::<_, Option<f64>>(2)?.unwrap_or(0.0), 4),
                policy_count: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    by_mode.sort_by_key(|m| mode_order(m.mode));

    Ok(PerformanceMetrics {
        avg_event_duration_ms: round_to(avg_duration.unwrap_or(0.0), 2),
        policy_performance: by_mode,
    })
}

pub fn violations_by_category(state: &AppState) -> Result<Vec<CategoryCount>, AppError> {
    let conn = lock_db(&state.db)?;
    category_counts(&conn)
}

/// One entry per policy status, zero counts included.
pub fn policies_by_status(state: &AppState) -> Result<Vec<StatusCount>, AppError> {
    let conn = lock_db(&state.db)?;
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM policies GROUP BY status")?;
    let counts = stmt
        .query_map([], |row| Ok((row.get::<_, PolicyStatus>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(PolicyStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: counts.get(status).copied().unwrap_or(0),
        })
        .collect())
}

fn mode_order(mode: PerformanceMode) -> usize {
    PerformanceMode::ALL
        .iter()
        .position(|m| *m == mode)
        .unwrap_or(usize::MAX)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::round_to;

    #[test]
    fn rounding_matches_reported_precision() {
        assert_eq!(round_to(123.456, 2), 123.46);
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
