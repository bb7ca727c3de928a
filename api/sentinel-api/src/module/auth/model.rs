use super::schema::{UserResponse, UserRole};
use crate::module::common::{db_time, db_time_opt};
use chrono::{DateTime, Utc};
use rusqlite::Row;

pub const USER_COLUMNS: &str = "id, username, email, hashed_password, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            hashed_password: row.get("hashed_password")?,
            role: row.get("role")?,
            created_at: db_time(row, "created_at")?,
            updated_at: db_time_opt(row, "updated_at")?,
        })
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}
