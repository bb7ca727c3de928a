use crate::config::environment::AppConfig;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub channel: String,
}

impl DatabaseConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            path: app.database_path.clone(),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

impl RedisConfig {
    pub fn from_app(app: &AppConfig) -> Option<Self> {
        app.redis_url.as_ref().map(|url| Self {
            url: url.clone(),
            channel: app.realtime_channel.clone(),
        })
    }
}
