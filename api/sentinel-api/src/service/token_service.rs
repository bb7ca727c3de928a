use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const JWT_ISSUER: &str = "sentinel-api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub uid: i64,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

pub fn issue_access_token(
    user_id: i64,
    username: &str,
    role: &str,
    jwt_secret: &str,
    ttl_minutes: i64,
) -> Result<(String, i64), String> {
    if ttl_minutes <= 0 {
        return Err("ACCESS_TOKEN_TTL_MINUTES must be positive".to_string());
    }
    let iat = Utc::now().timestamp();
    let exp = ttl_minutes
        .checked_mul(60)
        .and_then(|ttl| iat.checked_add(ttl))
        .ok_or_else(|| "invalid jwt expiration".to_string())?;
    let claims = AccessClaims {
        sub: username.to_string(),
        uid: user_id,
        role: role.to_string(),
        iat,
        exp,
        iss: JWT_ISSUER.to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| format!("jwt issue failed: {e}"))?;
    Ok((token, exp))
}

pub fn verify_access_token(token: &str, jwt_secret: &str) -> Result<AccessClaims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[JWT_ISSUER]);
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("jwt verify failed: {e}"))?;
    Ok(data.claims)
}

pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
