//! Demo data for an empty database: users, templates, policies, events and
//! violations, written in one transaction.

use crate::infra::Database;
use crate::module::auth::crud::{count_users, insert_user};
use crate::module::auth::schema::UserRole;
use crate::module::common::{Severity, lock_db, now_utc, to_db_time};
use crate::module::error::AppError;
use crate::module::event::schema::{EventStatus, EventType};
use crate::module::policy::schema::{
    InterventionType, PerformanceMode, PolicyCategory, PolicyStatus,
};
use crate::module::violation::schema::{ViolationStatus, ViolationType};
use crate::service::password_service::hash_password;
use chrono::Duration;
use rand::Rng;
use rand::seq::SliceRandom;
use rusqlite::{Connection, params};
use tracing::info;
use uuid::Uuid;

pub const SEED_PASSWORD: &str = "secret";
const SEED_EVENTS: usize = 50;
const SEED_VIOLATIONS: usize = 20;

const USERS: [(&str, &str, UserRole); 4] = [
    ("admin", "admin@sentinelai.ai", UserRole::Admin),
    ("jimmy.sanchez", "jimmy@sentinelai.ai", UserRole::Analyst),
    ("george.torres", "george@sentinelai.ai", UserRole::Analyst),
    ("clarence.bell", "clarence@sentinelai.ai", UserRole::Viewer),
];

struct TemplateSeed {
    name: &'static str,
    category: PolicyCategory,
    description: &'static str,
    template_code: &'static str,
    severity: Severity,
    tags: &'static str,
}

const TEMPLATES: [TemplateSeed; 4] = [
    TemplateSeed {
        name: "Prompt Injection Prevention",
        category: PolicyCategory::DataSecurity,
        description: "Protect against malicious attempts to manipulate the LLM via prompt injection.",
        template_code: "response.completion has sentinelai.sunshine_acceptable_use_violation and scope.app is Sunshine",
        severity: Severity::Medium,
        tags: "injection,manipulation,security",
    },
    TemplateSeed {
        name: "Data Leakage Prevention",
        category: PolicyCategory::Privacy,
        description: "Prevent unauthorized exposure and leakage of sensitive data.",
        template_code: "response.completion has sentinelai.data_leakage and scope.app is DataApp",
        severity: Severity::High,
        tags: "leakage,data protection,unauthorized access",
    },
    TemplateSeed {
        name: "Legal Compliance Monitoring",
        category: PolicyCategory::Compliance,
        description: "Ensure compliance with relevant laws and regulations.",
        template_code: "response.completion has sentinelai.legal_compliance and scope.app is LegalBot",
        severity: Severity::High,
        tags: "legal compliance,monitoring,regulation",
    },
    TemplateSeed {
        name: "Intellectual Property Protection",
        category: PolicyCategory::Governance,
        description: "Safeguard intellectual property in LLM outputs.",
        template_code: "response.completion has sentinelai.ip_protection and scope.app is IPGuard",
        severity: Severity::Medium,
        tags: "IP protection,intellectual property,copyright",
    },
];

struct PolicySeed {
    name: &'static str,
    rule: &'static str,
    app: &'static str,
    category: PolicyCategory,
    status: PolicyStatus,
    severity: Severity,
    mode: PerformanceMode,
    intervention: InterventionType,
    /// Index into `USERS`.
    owner: usize,
}

const POLICIES: [PolicySeed; 10] = [
    PolicySeed {
        name: "Sunshine Acceptable Use Policy",
        rule: "sunshine_acceptable_use_violation",
        app: "Sunshine",
        category: PolicyCategory::DataSecurity,
        status: PolicyStatus::Open,
        severity: Severity::Low,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Notification,
        owner: 0,
    },
    PolicySeed {
        name: "Legal Compliance Monitoring Policy",
        rule: "legal_compliance",
        app: "LegalBot",
        category: PolicyCategory::Compliance,
        status: PolicyStatus::Open,
        severity: Severity::Low,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Notification,
        owner: 1,
    },
    PolicySeed {
        name: "Incident Detection and Response Policy",
        rule: "incident_detection",
        app: "SecurityBot",
        category: PolicyCategory::IncidentDetection,
        status: PolicyStatus::Acknowledged,
        severity: Severity::Medium,
        mode: PerformanceMode::Robust,
        intervention: InterventionType::Block,
        owner: 1,
    },
    PolicySeed {
        name: "Prompt Injection Prevention Policy",
        rule: "prompt_injection",
        app: "ChatBot",
        category: PolicyCategory::DataSecurity,
        status: PolicyStatus::Open,
        severity: Severity::Medium,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Redact,
        owner: 0,
    },
    PolicySeed {
        name: "Governance Policy Enforcement Policy",
        rule: "governance_policy",
        app: "PolicyBot",
        category: PolicyCategory::Governance,
        status: PolicyStatus::Acknowledged,
        severity: Severity::Medium,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Notification,
        owner: 2,
    },
    PolicySeed {
        name: "Intellectual Property Protection Policy",
        rule: "ip_protection",
        app: "ContentBot",
        category: PolicyCategory::Governance,
        status: PolicyStatus::Open,
        severity: Severity::Low,
        mode: PerformanceMode::Fast,
        intervention: InterventionType::Notification,
        owner: 3,
    },
    PolicySeed {
        name: "Security and Data Protection Policy",
        rule: "data_protection",
        app: "DataBot",
        category: PolicyCategory::Privacy,
        status: PolicyStatus::Open,
        severity: Severity::Low,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Notification,
        owner: 3,
    },
    PolicySeed {
        name: "Data Leakage Prevention Policy",
        rule: "data_leakage",
        app: "SecureBot",
        category: PolicyCategory::Privacy,
        status: PolicyStatus::Open,
        severity: Severity::Low,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Block,
        owner: 0,
    },
    PolicySeed {
        name: "CSR Compliance Policy",
        rule: "csr_compliance",
        app: "CSRBot",
        category: PolicyCategory::Compliance,
        status: PolicyStatus::Open,
        severity: Severity::Low,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Notification,
        owner: 2,
    },
    PolicySeed {
        name: "Data Minimization Policy",
        rule: "data_minimization",
        app: "MinimalBot",
        category: PolicyCategory::Privacy,
        status: PolicyStatus::Acknowledged,
        severity: Severity::Medium,
        mode: PerformanceMode::Balanced,
        intervention: InterventionType::Redact,
        owner: 1,
    },
];

const EVENT_TITLES: [&str; 4] = ["Policy Violation", "Data Leak", "Prompt Injection", "Compliance Issue"];
const MODEL_NAMES: [&str; 3] = ["gpt-3.5-turbo-0125", "gpt-4", "claude-3"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub templates: usize,
    pub policies: usize,
    pub events: usize,
    pub violations: usize,
}

/// Seeds only when no user exists yet. Returns `None` when skipped.
pub fn seed_database(db: &Database) -> Result<Option<SeedSummary>, AppError> {
    let mut conn = lock_db(db)?;
    if count_users(&conn)? > 0 {
        info!("database already populated; seeding skipped");
        return Ok(None);
    }

    let tx = conn.transaction()?;
    let user_ids = seed_users(&tx)?;
    let templates = seed_templates(&tx)?;
    let policy_ids = seed_policies(&tx, &user_ids)?;
    let events = seed_events(&tx, &policy_ids, &user_ids)?;
    let violations = seed_violations(&tx, &events)?;
    tx.commit()?;

    let summary = SeedSummary {
        users: user_ids.len(),
        templates,
        policies: policy_ids.len(),
        events: events.len(),
        violations,
    };
    info!(
        users = summary.users,
        templates = summary.templates,
        policies = summary.policies,
        events = summary.events,
        violations = summary.violations,
        "database seeded"
    );
    Ok(Some(summary))
}

fn seed_users(conn: &Connection) -> Result<Vec<i64>, AppError> {
    USERS
        .iter()
        .map(|(username, email, role)| {
            let hashed = hash_password(SEED_PASSWORD)
                .map_err(|e| AppError::internal("PASSWORD_HASH_ERROR", e))?;
            insert_user(conn, username, email, &hashed, *role)
        })
        .collect()
}

fn seed_templates(conn: &Connection) -> Result<usize, AppError> {
    for t in &TEMPLATES {
        conn.execute(
            "INSERT INTO policy_templates (name, category, description, template_code,
                 default_severity, default_performance_mode, tags, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
            params![
                t.name,
                t.category,
                t.description,
                t.template_code,
                t.severity,
                PerformanceMode::Balanced,
                t.tags,
            ],
        )?;
    }
    Ok(TEMPLATES.len())
}

fn seed_policies(conn: &Connection, user_ids: &[i64]) -> Result<Vec<i64>, AppError> {
    let created_at = to_db_time(&now_utc());
    let mut ids = Vec::with_capacity(POLICIES.len());
    for p in &POLICIES {
        conn.execute(
            "INSERT INTO policies (name, definition, category, status, severity, performance_mode,
                 intervention_type, estimated_cost_per_event, estimated_latency_ms, created_by,
                 created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                p.name,
                format!(
                    "response.completion has sentinelai.{} and scope.app is {}",
                    p.rule, p.app
                ),
                p.category,
                p.status,
                p.severity,
                p.mode,
                p.intervention,
                p.mode.estimated_cost_per_event(),
                p.mode.estimated_latency_ms(),
                user_ids.get(p.owner).copied(),
                created_at,
            ],
        )?;
        ids.push(conn.last_insert_rowid());
    }
    Ok(ids)
}

struct SeededEvent {
    id: i64,
    event_id: String,
    title: String,
    policy_id: Option<i64>,
}

fn seed_events(
    conn: &Connection,
    policy_ids: &[i64],
    user_ids: &[i64],
) -> Result<Vec<SeededEvent>, AppError> {
    let mut rng = rand::thread_rng();
    let now = now_utc();
    let mut events = Vec::with_capacity(SEED_EVENTS);

    for n in 1..=SEED_EVENTS {
        let trigger_date = now
            - Duration::days(rng.gen_range(0..=29))
            - Duration::hours(rng.gen_range(0..=23))
            - Duration::minutes(rng.gen_range(0..=59));
        let event_id = format!("evt_{}", &Uuid::new_v4().simple().to_string()[..8]);
        let title = format!(
            "Event {n}: {}",
            EVENT_TITLES.choose(&mut rng).copied().unwrap_or("Policy Violation")
        );
        let policy_id = policy_ids.choose(&mut rng).copied();

        conn.execute(
            "INSERT INTO events (event_id, event_type, severity, status, title, description,
                 model_name, request_tokens, response_tokens, trigger_date, duration_ms,
                 policy_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                event_id,
                pick(&mut rng, EventType::ALL),
                pick(&mut rng, Severity::ALL),
                pick(&mut rng, EventStatus::ALL),
                title,
                format!("Automated detection of potential issue in AI interaction {n}"),
                MODEL_NAMES.choose(&mut rng).copied(),
                rng.gen_range(50..=500i64),
                rng.gen_range(20..=200i64),
                to_db_time(&trigger_date),
                rng.gen_range(50.0..300.0f64),
                policy_id,
                user_ids.choose(&mut rng).copied(),
                to_db_time(&trigger_date),
            ],
        )?;
        events.push(SeededEvent {
            id: conn.last_insert_rowid(),
            event_id,
            title,
            policy_id,
        });
    }
    Ok(events)
}

fn seed_violations(conn: &Connection, events: &[SeededEvent]) -> Result<usize, AppError> {
    let mut rng = rand::thread_rng();
    let mut count = 0;
    for (n, event) in events.iter().take(SEED_VIOLATIONS).enumerate() {
        let Some(policy_id) = event.policy_id else {
            continue;
        };
        conn.execute(
            "INSERT INTO violations (violation_type, severity, status, title, description,
                 confidence_score, legal_advice_score, controversial_topics_score,
                 code_prompt_score, safe_prompt_score, event_id, policy_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                pick(&mut rng, ViolationType::ALL),
                pick(&mut rng, Severity::ALL),
                pick(&mut rng, ViolationStatus::ALL),
                format!("Violation {}: {}", n + 1, event.title),
                format!("Policy violation detected in event {}", event.event_id),
                rng.gen_range(0.6..0.95f64),
                rng.gen_range(0.1..0.9f64),
                rng.gen_range(0.1..0.8f64),
                rng.gen_range(0.1..0.7f64),
                rng.gen_range(0.2..0.9f64),
                event.id,
                policy_id,
                to_db_time(&now_utc()),
            ],
        )?;
        count += 1;
    }
    Ok(count)
}

fn pick<T: Copy, R: Rng>(rng: &mut R, values: &[T]) -> T {
    values[rng.gen_range(0..values.len())]
}
