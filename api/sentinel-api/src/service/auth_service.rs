use crate::app::AppState;
use crate::module::auth::crud::find_by_id;
use crate::module::auth::schema::UserRole;
use crate::module::common::lock_db;
use crate::module::error::AppError;
use crate::service::token_service::{bearer_token, verify_access_token};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::warn;

/// Identity carried by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
}

/// Resolves the caller for a mutating request. Without a token this yields
/// `None`, unless `REQUIRE_AUTH` is on. A token that is present but invalid
/// is always rejected.
pub fn resolve_principal(state: &AppState, headers: &HeaderMap) -> Result<Option<Principal>, AppError> {
    if headers.get(AUTHORIZATION).is_none() {
        if state.config.require_auth {
            return Err(AppError::unauthorized(
                "AUTH_REQUIRED",
                "Not authenticated",
            ));
        }
        return Ok(None);
    }
    require_principal(state, headers).map(Some)
}

pub fn require_principal(state: &AppState, headers: &HeaderMap) -> Result<Principal, AppError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("AUTH_REQUIRED", "Not authenticated"))?
        .to_str()
        .map_err(|_| invalid_token())?;
    let token = bearer_token(raw).ok_or_else(invalid_token)?;
    let claims = verify_access_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!(reason = %e, "bearer token rejected");
        invalid_token()
    })?;

    let conn = lock_db(&state.db)?;
    let user = find_by_id(&conn, claims.uid)?
        .filter(|u| u.username == claims.sub)
        .ok_or_else(invalid_token)?;
    Ok(Principal {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}

/// A caller may only record acknowledgments in their own name.
pub fn check_acknowledger(principal: Option<&Principal>, requested: Option<i64>) -> Result<(), AppError> {
    match (principal, requested) {
        (Some(p), Some(requested)) if p.user_id != requested => Err(AppError::forbidden(
            "ACKNOWLEDGER_MISMATCH",
            format!(
                "acknowledged_by {requested} does not match the authenticated user {}",
                p.user_id
            ),
        )),
        _ => Ok(()),
    }
}

fn invalid_token() -> AppError {
    AppError::unauthorized("INVALID_TOKEN", "Could not validate credentials")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyst() -> Principal {
        Principal {
            user_id: 2,
            username: "jimmy.sanchez".to_string(),
            role: UserRole::Analyst,
        }
    }

    #[test]
    fn acknowledger_must_match_principal() {
        let p = analyst();
        assert!(check_acknowledger(Some(&p), Some(2)).is_ok());
        assert!(check_acknowledger(Some(&p), None).is_ok());
        let err = check_acknowledger(Some(&p), Some(1)).expect_err("mismatch");
        assert_eq!(err.code, "ACKNOWLEDGER_MISMATCH");
    }

    #[test]
    fn anonymous_acknowledger_is_accepted() {
        assert!(check_acknowledger(None, Some(1)).is_ok());
    }
}
