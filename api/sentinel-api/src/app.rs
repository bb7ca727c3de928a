use crate::config::environment::AppConfig;
use crate::infra::{Database, InfraClients};
use crate::module::{auth, dashboard, event, health, policy, realtime, violation};
use crate::service::notifier_service::{NotifierHub, RedisRelay};
use crate::service::policy_eval_service::{MockPolicyEvaluator, PolicyEvaluator};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<Database>,
    pub notifier: Arc<NotifierHub>,
    pub evaluator: Arc<dyn PolicyEvaluator>,
    pub infra: Option<InfraClients>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Arc<Database>, infra: Option<InfraClients>) -> Self {
        let relay = infra.as_ref().map(RedisRelay::new);
        Self {
            config,
            db,
            notifier: Arc::new(NotifierHub::new(relay)),
            evaluator: Arc::new(MockPolicyEvaluator),
            infra,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .merge(health::route::register_routes(state.clone()))
        .merge(auth::route::register_routes(state.clone()))
        .merge(policy::route::register_routes(state.clone()))
        .merge(event::route::register_routes(state.clone()))
        .merge(realtime::route::register_routes(state.clone()))
        .merge(violation::route::register_routes(state.clone()))
        .merge(dashboard::route::register_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}
