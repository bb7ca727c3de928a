use sentinel_api::app::{AppState, build_router};
use sentinel_api::config::db::{DatabaseConfig, RedisConfig};
use sentinel_api::config::environment::AppConfig;
use sentinel_api::infra::{Database, init_infra};
use sentinel_api::service::notifier_service::run_relay_subscriber;
use sentinel_api::service::seed_service::seed_database;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    init_logging();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "config error");
            std::process::exit(1);
        }
    };

    let db = match Database::open(&DatabaseConfig::from_app(&config)) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!(error = %e, path = %config.database_path, "database open error");
            std::process::exit(1);
        }
    };
    if config.seed_on_startup {
        if let Err(e) = seed_database(&db) {
            error!(error = %e, "database seeding failed");
            std::process::exit(1);
        }
    }

    let infra = match init_infra(RedisConfig::from_app(&config).as_ref()).await {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "infra init failed; realtime relay disabled");
            None
        }
    };

    let bind_addr = format!("{}:{}", config.api_host, config.api_port);
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, bind_addr = %bind_addr, "server bind error");
            std::process::exit(1);
        }
    };

    info!(
        env = %config.rust_env,
        host = %config.api_host,
        port = config.api_port,
        require_auth = config.require_auth,
        relay = infra.is_some(),
        "sentinel-api started"
    );

    let state = AppState::new(config, db, infra);
    let hub = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = run_relay_subscriber(hub).await {
            warn!(error = %e, "realtime relay stopped");
        }
    });

    let app = build_router(state);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server runtime error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "shutdown signal listener failed");
    }
    info!("shutdown signal received");
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
