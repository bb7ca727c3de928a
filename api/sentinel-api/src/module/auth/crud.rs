use super::model::{USER_COLUMNS, UserRecord};
use super::schema::{LoginRequest, TokenResponse, UserResponse, UserRole};
use crate::app::AppState;
use crate::module::common::{lock_db, now_utc, to_db_time};
use crate::module::error::AppError;
use crate::service::auth_service::Principal;
use crate::service::password_service::verify_password;
use crate::service::token_service::issue_access_token;
use rusqlite::{Connection, OptionalExtension, params};

pub fn login(state: &AppState, req: LoginRequest) -> Result<TokenResponse, AppError> {
    let user = {
        let conn = lock_db(&state.db)?;
        find_by_username(&conn, req.username.trim())?
    };
    let Some(user) = user.filter(|u| verify_password(&req.password, &u.hashed_password)) else {
        return Err(AppError::unauthorized(
            "INVALID_CREDENTIALS",
            "Incorrect username or password",
        ));
    };

    let (access_token, expires_at) = issue_access_token(
        user.id,
        &user.username,
        user.role.as_str(),
        &state.config.jwt_secret,
        state.config.access_token_ttl_minutes,
    )
    .map_err(|e| AppError::internal("TOKEN_ISSUE_ERROR", e))?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_at,
    })
}

pub fn current_user(state: &AppState, principal: &Principal) -> Result<UserResponse, AppError> {
    let conn = lock_db(&state.db)?;
    find_by_id(&conn, principal.user_id)?
        .map(|u| u.to_response())
        .ok_or_else(|| AppError::unauthorized("INVALID_TOKEN", "Could not validate credentials"))
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<UserRecord>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    Ok(conn
        .query_row(&sql, params![username], UserRecord::from_row)
        .optional()?)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<UserRecord>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], UserRecord::from_row)
        .optional()?)
}

pub fn user_exists(conn: &Connection, id: i64) -> Result<bool, AppError> {
    Ok(conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Rejects references to users that do not exist.
pub fn ensure_user(conn: &Connection, user_id: i64) -> Result<(), AppError> {
    if user_exists(conn, user_id)? {
        return Ok(());
    }
    Err(AppError::unprocessable(
        "UNKNOWN_USER",
        format!("user {user_id} does not exist"),
    ))
}

pub fn count_users(conn: &Connection) -> Result<i64, AppError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}

pub fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    hashed_password: &str,
    role: UserRole,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO users (username, email, hashed_password, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![username, email, hashed_password, role, to_db_time(&now_utc())],
    )?;
    Ok(conn.last_insert_rowid())
}
