use super::schema::{HealthResponse, ServiceInfo};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "SentinelAI AI Governance Platform API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs: "/docs".to_string(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        database_available: state.db.ping(),
        realtime_clients: state.notifier.connected_clients(),
    })
}
