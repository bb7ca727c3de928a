//! Table definitions. Every statement is idempotent so startup can always run it.
//!
//! `events.policy_id` and `violations.policy_id` intentionally carry no
//! foreign key: deleting a policy leaves its events and violations in place.

use rusqlite::Connection;

pub fn apply_pragmas(conn: &Connection, file_backed: bool) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )?;
    if file_backed {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
    }
    Ok(())
}

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            hashed_password TEXT NOT NULL,
            role            TEXT NOT NULL DEFAULT 'viewer',
            created_at      TEXT NOT NULL,
            updated_at      TEXT
        );

        CREATE TABLE IF NOT EXISTS policies (
            id                       INTEGER PRIMARY KEY AUTOINCREMENT,
            name                     TEXT NOT NULL,
            definition               TEXT NOT NULL,
            category                 TEXT NOT NULL,
            status                   TEXT NOT NULL DEFAULT 'draft',
            severity                 TEXT NOT NULL DEFAULT 'medium',
            performance_mode         TEXT NOT NULL DEFAULT 'balanced',
            intervention_type        TEXT NOT NULL DEFAULT 'notification',
            intervention_config      TEXT,
            estimated_cost_per_event REAL NOT NULL DEFAULT 0.0,
            estimated_latency_ms     REAL NOT NULL DEFAULT 0.0,
            created_by               INTEGER REFERENCES users(id),
            created_at               TEXT NOT NULL,
            updated_at               TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_policies_name ON policies(name);
        CREATE INDEX IF NOT EXISTS idx_policies_status ON policies(status);
        CREATE INDEX IF NOT EXISTS idx_policies_created ON policies(created_at);

        CREATE TABLE IF NOT EXISTS policy_templates (
            id                       INTEGER PRIMARY KEY AUTOINCREMENT,
            name                     TEXT NOT NULL,
            category                 TEXT NOT NULL,
            description              TEXT NOT NULL,
            template_code            TEXT NOT NULL,
            default_severity         TEXT NOT NULL DEFAULT 'medium',
            default_performance_mode TEXT NOT NULL DEFAULT 'balanced',
            tags                     TEXT,
            is_active                INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS events (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id            TEXT NOT NULL UNIQUE,
            event_type          TEXT NOT NULL,
            severity            TEXT NOT NULL DEFAULT 'low',
            status              TEXT NOT NULL DEFAULT 'open',
            title               TEXT NOT NULL,
            description         TEXT,
            event_data          TEXT,
            model_name          TEXT,
            request_tokens      INTEGER,
            response_tokens     INTEGER,
            completion_reason   TEXT,
            request_temperature REAL,
            request_max_tokens  INTEGER,
            trigger_date        TEXT NOT NULL,
            duration_ms         REAL,
            policy_id           INTEGER,
            user_id             INTEGER REFERENCES users(id),
            acknowledged_by     INTEGER REFERENCES users(id),
            acknowledged_date   TEXT,
            created_at          TEXT NOT NULL,
            updated_at          TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_events_trigger ON events(trigger_date);
        CREATE INDEX IF NOT EXISTS idx_events_policy ON events(policy_id);
        CREATE INDEX IF NOT EXISTS idx_events_status ON events(status);

        CREATE TABLE IF NOT EXISTS violations (
            id                         INTEGER PRIMARY KEY AUTOINCREMENT,
            violation_type             TEXT NOT NULL,
            severity                   TEXT NOT NULL,
            status                     TEXT NOT NULL DEFAULT 'detected',
            title                      TEXT NOT NULL,
            description                TEXT,
            details                    TEXT,
            confidence_score           REAL NOT NULL DEFAULT 0.0
                CHECK (confidence_score >= 0.0 AND confidence_score <= 1.0),
            legal_advice_score         REAL,
            controversial_topics_score REAL,
            code_prompt_score          REAL,
            safe_prompt_score          REAL,
            event_id                   INTEGER NOT NULL REFERENCES events(id),
            policy_id                  INTEGER NOT NULL,
            acknowledged_by            INTEGER REFERENCES users(id),
            acknowledged_date          TEXT,
            created_at                 TEXT NOT NULL,
            updated_at                 TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_violations_event ON violations(event_id);
        CREATE INDEX IF NOT EXISTS idx_violations_policy ON violations(policy_id);
        CREATE INDEX IF NOT EXISTS idx_violations_created ON violations(created_at);
        ",
    )
}
