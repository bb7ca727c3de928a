use std::env;
use tracing::warn;

pub const DEV_JWT_SECRET: &str = "sentinel-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub api_host: String,
    pub api_port: u16,
    pub database_path: String,
    pub redis_url: Option<String>,
    pub realtime_channel: String,
    pub cors_allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub require_auth: bool,
    pub seed_on_startup: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        load_dotenv_layers();
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let access_token_ttl_minutes = read_optional_i64("ACCESS_TOKEN_TTL_MINUTES", 30)?;
        if access_token_ttl_minutes <= 0 {
            return Err("ACCESS_TOKEN_TTL_MINUTES must be positive".to_string());
        }

        Ok(Self {
            rust_env: read_optional_string("RUST_ENV", "development"),
            api_host: read_optional_string("API_HOST", "0.0.0.0"),
            api_port: read_optional_string("API_PORT", "8000")
                .parse::<u16>()
                .map_err(|e| format!("invalid API_PORT: {e}"))?,
            database_path: read_optional_string("DATABASE_PATH", "./sentinel.db"),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            realtime_channel: read_optional_string("REALTIME_CHANNEL", "sentinel:realtime"),
            cors_allowed_origins: parse_origins(&read_optional_string(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:3000,http://127.0.0.1:3000",
            )),
            jwt_secret,
            access_token_ttl_minutes,
            require_auth: read_optional_bool("REQUIRE_AUTH", false),
            seed_on_startup: read_optional_bool("SEED_ON_STARTUP", true),
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn read_optional_i64(key: &str, default: i64) -> Result<i64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<i64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"),
        Err(_) => default,
    }
}

fn read_optional_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn load_dotenv_layers() {
    for path in [".env", "../.env", "../../.env"] {
        let _ = dotenvy::from_path(path);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_origins;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        let origins = parse_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }
}
