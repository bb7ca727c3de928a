pub mod migrations;

use crate::config::db::{DatabaseConfig, RedisConfig};
use redis::Client as RedisClient;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const POLICIES_TABLE: &str = "policies";
pub const EVENTS_TABLE: &str = "events";
pub const VIOLATIONS_TABLE: &str = "violations";

/// Single SQLite connection shared by every request. Handlers lock it for
/// the duration of one unit of work and release it before responding.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(config: &DatabaseConfig) -> Result<Self, String> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.path)
        }
        .map_err(|e| format!("sqlite open failed for {}: {e}", config.path))?;
        migrations::apply_pragmas(&conn, !config.is_in_memory())
            .map_err(|e| format!("sqlite pragmas failed: {e}"))?;
        migrations::migrate(&conn).map_err(|e| format!("sqlite migration failed: {e}"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, String> {
        Self::open(&DatabaseConfig {
            path: ":memory:".to_string(),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, PoisonError<MutexGuard<'_, Connection>>> {
        self.conn.lock()
    }

    pub fn ping(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfraClients {
    pub redis: RedisClient,
    pub realtime_channel: String,
}

pub async fn init_infra(redis: Option<&RedisConfig>) -> Result<Option<InfraClients>, String> {
    let Some(redis) = redis else {
        return Ok(None);
    };

    let client =
        RedisClient::open(redis.url.clone()).map_err(|e| format!("redis client init failed: {e}"))?;
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| format!("redis connect failed: {e}"))?;
    let _: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| format!("redis ping failed: {e}"))?;

    Ok(Some(InfraClients {
        redis: client,
        realtime_channel: redis.channel.clone(),
    }))
}
