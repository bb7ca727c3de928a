//! Typed access to every API endpoint. Requests carry the stored bearer token
//! when there is one; a 401 clears it so the next command asks for a login.

use crate::error::{ClientError, ClientResult};
use crate::token_store::TokenStore;
use crate::types::*;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = match option_env!("SENTINEL_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.tokens.load()? {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::TokenStore(format!("invalid stored token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        Ok(self
            .http
            .request(method, self.url(path))
            .headers(self.auth_headers()?))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!(status = status.as_u16(), url = %resp.url(), "api response");
        if status.is_success() {
            let bytes = resp.bytes().await?;
            return serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()));
        }
        let body: ErrorBody = resp.json().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.clear()?;
        }
        Err(map_status(status, body))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)?).await
    }

    async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)?.query(query)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::PUT, path)?.json(body)).await
    }

    // auth

    /// Logs in and stores the issued token.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<TokenResponse> {
        let body = serde_json::json!({ "username": username, "password": password });
        let token: TokenResponse = self.post("/api/auth/login", &body).await?;
        self.tokens.save(&token.access_token)?;
        Ok(token)
    }

    /// Form-encoded variant of [`ApiClient::login`].
    pub async fn token(&self, username: &str, password: &str) -> ClientResult<TokenResponse> {
        let req = self
            .request(Method::POST, "/api/auth/token")?
            .form(&[("username", username), ("password", password)]);
        let token: TokenResponse = self.send(req).await?;
        self.tokens.save(&token.access_token)?;
        Ok(token)
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.get("/api/auth/me").await
    }

    /// Tells the server and forgets the local token even if the call fails.
    pub async fn logout(&self) -> ClientResult<Message> {
        let result = match self.request(Method::POST, "/api/auth/logout") {
            Ok(req) => self.send(req).await,
            Err(e) => Err(e),
        };
        self.tokens.clear()?;
        result
    }

    pub async fn health(&self) -> ClientResult<Health> {
        self.get("/health").await
    }

    // policies

    pub async fn list_policies(&self, query: &ListQuery) -> ClientResult<Vec<Policy>> {
        self.get_with("/api/policies", query).await
    }

    pub async fn get_policy(&self, id: i64) -> ClientResult<Policy> {
        self.get(&format!("/api/policies/{id}")).await
    }

    pub async fn create_policy(&self, policy: &NewPolicy) -> ClientResult<Policy> {
        self.post("/api/policies", policy).await
    }

    pub async fn update_policy(&self, id: i64, patch: &PolicyPatch) -> ClientResult<Policy> {
        self.put(&format!("/api/policies/{id}"), patch).await
    }

    pub async fn delete_policy(&self, id: i64) -> ClientResult<Message> {
        self.send(self.request(Method::DELETE, &format!("/api/policies/{id}"))?)
            .await
    }

    pub async fn list_templates(&self) -> ClientResult<Vec<PolicyTemplate>> {
        self.get("/api/policies/templates").await
    }

    pub async fn test_policy(&self, id: i64, sample: &Value) -> ClientResult<PolicyTestResult> {
        self.post(&format!("/api/policies/{id}/test"), sample).await
    }

    // events

    pub async fn list_events(&self, query: &ListQuery) -> ClientResult<Vec<Event>> {
        self.get_with("/api/events", query).await
    }

    pub async fn get_event(&self, id: i64) -> ClientResult<Event> {
        self.get(&format!("/api/events/{id}")).await
    }

    pub async fn update_event(&self, id: i64, change: &StatusChange) -> ClientResult<Event> {
        self.put(&format!("/api/events/{id}"), change).await
    }

    pub async fn event_violations(&self, id: i64) -> ClientResult<Vec<Violation>> {
        self.get(&format!("/api/events/{id}/violations")).await
    }

    pub async fn event_stats(&self) -> ClientResult<EventStats> {
        self.get("/api/events/stats/summary").await
    }

    // violations

    pub async fn list_violations(&self, query: &ListQuery) -> ClientResult<Vec<Violation>> {
        self.get_with("/api/violations", query).await
    }

    pub async fn get_violation(&self, id: i64) -> ClientResult<Violation> {
        self.get(&format!("/api/violations/{id}")).await
    }

    pub async fn update_violation(
        &self,
        id: i64,
        change: &StatusChange,
    ) -> ClientResult<Violation> {
        self.put(&format!("/api/violations/{id}"), change).await
    }

    pub async fn violation_stats(&self) -> ClientResult<ViolationStats> {
        self.get("/api/violations/stats/summary").await
    }

    // dashboard

    pub async fn dashboard_stats(&self) -> ClientResult<DashboardStats> {
        self.get("/api/dashboard/stats").await
    }

    pub async fn events_timeline(&self, days: u32) -> ClientResult<Vec<TimelineBucket>> {
        self.get_with("/api/dashboard/events/timeline", &[("days", days)])
            .await
    }

    pub async fn recent_activity(&self, limit: u32) -> ClientResult<Vec<ActivityItem>> {
        self.get_with("/api/dashboard/recent-activity", &[("limit", limit)])
            .await
    }

    pub async fn performance_metrics(&self) -> ClientResult<PerformanceMetrics> {
        self.get("/api/dashboard/performance-metrics").await
    }

    pub async fn violations_by_category(&self) -> ClientResult<Vec<CategoryCount>> {
        self.get("/api/dashboard/violations/by-category").await
    }

    pub async fn policies_by_status(&self) -> ClientResult<Vec<StatusCount>> {
        self.get("/api/dashboard/policies/by-status").await
    }
}

fn map_status(status: StatusCode, body: ErrorBody) -> ClientError {
    let ErrorBody { error_code, detail } = body;
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound(detail),
        StatusCode::FORBIDDEN => ClientError::Forbidden {
            code: error_code,
            detail,
        },
        StatusCode::CONFLICT => ClientError::Conflict {
            code: error_code,
            detail,
        },
        s if s.is_client_error() => ClientError::Validation {
            code: error_code,
            detail,
        },
        s => ClientError::Server {
            status: s.as_u16(),
            detail,
        },
    }
}
