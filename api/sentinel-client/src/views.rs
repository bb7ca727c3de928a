//! Terminal counterparts of the dashboard pages: each view keeps the last
//! fetched page and filters it locally; mutations are followed by a re-fetch.

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::types::*;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

pub const DASHBOARD_POLL_PERIOD: Duration = Duration::from_secs(30);
pub const TIMELINE_DAYS: u32 = 7;
pub const ACTIVITY_LIMIT: u32 = 10;

/// Free-text search plus the three dropdowns. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub category: Option<String>,
}

pub trait Filterable {
    /// Title or name, description and type, in that order.
    fn search_fields(&self) -> Vec<&str>;
    fn status(&self) -> &str;
    fn severity(&self) -> &str;
    fn category(&self) -> &str;
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        let exact = |want: &Option<String>, have: &str| {
            want.as_deref()
                .map_or(true, |w| w.is_empty() || w.eq_ignore_ascii_case(have))
        };
        let search_hit = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                item.search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        };
        search_hit
            && exact(&self.status, item.status())
            && exact(&self.severity, item.severity())
            && exact(&self.category, item.category())
    }

    pub fn apply<'a, T: Filterable>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }
}

impl Filterable for Policy {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.definition.as_str(), self.category.as_str()]
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn severity(&self) -> &str {
        &self.severity
    }
    fn category(&self) -> &str {
        &self.category
    }
}

impl Filterable for Event {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.description.as_deref().unwrap_or_default(),
            self.event_type.as_str(),
        ]
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn severity(&self) -> &str {
        &self.severity
    }
    fn category(&self) -> &str {
        &self.event_type
    }
}

impl Filterable for Violation {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.description.as_deref().unwrap_or_default(),
            self.violation_type.as_str(),
        ]
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn severity(&self) -> &str {
        &self.severity
    }
    fn category(&self) -> &str {
        &self.violation_type
    }
}

#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<i64>,
    pub filter: Filter,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            selected: None,
            filter: Filter::default(),
        }
    }
}

impl<T: Filterable> ListView<T> {
    pub fn visible(&self) -> Vec<&T> {
        self.filter.apply(&self.items)
    }

    /// Replaces the items on success. On failure the previous page stays and
    /// the error is recorded and returned.
    fn settle(&mut self, result: ClientResult<Vec<T>>) -> ClientResult<()> {
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "list refresh failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

pub struct PolicyView {
    client: ApiClient,
    pub query: ListQuery,
    pub list: ListView<Policy>,
}

impl PolicyView {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            query: ListQuery::default(),
            list: ListView::default(),
        }
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.list.loading = true;
        let result = self.client.list_policies(&self.query).await;
        self.list.settle(result)
    }

    /// Flips a policy between `open` and `draft`.
    pub async fn toggle_status(&mut self, id: i64) -> ClientResult<Policy> {
        let current = self.client.get_policy(id).await?;
        let patch = PolicyPatch {
            status: Some(toggled_status(&current.status).to_string()),
            ..PolicyPatch::default()
        };
        let updated = self.client.update_policy(id, &patch).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn edit(&mut self, id: i64, patch: &PolicyPatch) -> ClientResult<Policy> {
        let updated = self.client.update_policy(id, patch).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: i64) -> ClientResult<Message> {
        let msg = self.client.delete_policy(id).await?;
        if self.list.selected == Some(id) {
            self.list.selected = None;
        }
        self.refresh().await?;
        Ok(msg)
    }
}

pub fn toggled_status(status: &str) -> &'static str {
    if status == "open" {
        "draft"
    } else {
        "open"
    }
}

pub struct EventView {
    client: ApiClient,
    pub query: ListQuery,
    pub list: ListView<Event>,
}

impl EventView {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            query: ListQuery::default(),
            list: ListView::default(),
        }
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.list.loading = true;
        let result = self.client.list_events(&self.query).await;
        self.list.settle(result)
    }

    pub async fn acknowledge(&mut self, id: i64, user_id: i64) -> ClientResult<Event> {
        let updated = self.client.update_event(id, &acknowledgment(user_id)).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn resolve(&mut self, id: i64) -> ClientResult<Event> {
        let updated = self.client.update_event(id, &resolution()).await?;
        self.refresh().await?;
        Ok(updated)
    }
}

pub struct ViolationView {
    client: ApiClient,
    pub query: ListQuery,
    pub list: ListView<Violation>,
}

impl ViolationView {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            query: ListQuery::default(),
            list: ListView::default(),
        }
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.list.loading = true;
        let result = self.client.list_violations(&self.query).await;
        self.list.settle(result)
    }

    pub async fn acknowledge(&mut self, id: i64, user_id: i64) -> ClientResult<Violation> {
        let updated = self
            .client
            .update_violation(id, &acknowledgment(user_id))
            .await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn resolve(&mut self, id: i64) -> ClientResult<Violation> {
        let updated = self.client.update_violation(id, &resolution()).await?;
        self.refresh().await?;
        Ok(updated)
    }
}

fn acknowledgment(user_id: i64) -> StatusChange {
    StatusChange {
        status: Some("acknowledged".to_string()),
        acknowledged_by: Some(user_id),
    }
}

fn resolution() -> StatusChange {
    StatusChange {
        status: Some("resolved".to_string()),
        acknowledged_by: None,
    }
}

/// The three dashboard panels as of the last refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub timeline: Vec<TimelineBucket>,
    pub activity: Vec<ActivityItem>,
    pub error: Option<String>,
}

pub struct DashboardView {
    client: ApiClient,
    pub loading: bool,
    pub snapshot: DashboardSnapshot,
}

impl DashboardView {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            loading: false,
            snapshot: DashboardSnapshot::default(),
        }
    }

    /// Issues the stats, timeline and activity fetches concurrently. Panels
    /// that fail keep their previous contents.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.loading = true;
        let (stats, timeline, activity) = tokio::join!(
            self.client.dashboard_stats(),
            self.client.events_timeline(TIMELINE_DAYS),
            self.client.recent_activity(ACTIVITY_LIMIT),
        );
        self.loading = false;

        let mut first_error: Option<ClientError> = None;
        match stats {
            Ok(s) => self.snapshot.stats = s,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match timeline {
            Ok(t) => self.snapshot.timeline = t,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match activity {
            Ok(a) => self.snapshot.activity = a,
            Err(e) => first_error = first_error.or(Some(e)),
        }

        match first_error {
            None => {
                self.snapshot.error = None;
                Ok(())
            }
            Some(e) => {
                warn!(error = %e, "dashboard refresh failed");
                self.snapshot.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// Re-runs the dashboard fetches on a fixed period and publishes each
/// snapshot. Polling stops on [`DashboardPoller::stop`] or drop.
pub struct DashboardPoller {
    handle: JoinHandle<()>,
    snapshots: watch::Receiver<DashboardSnapshot>,
}

impl DashboardPoller {
    pub fn start(client: ApiClient) -> Self {
        Self::with_period(client, DASHBOARD_POLL_PERIOD)
    }

    pub fn with_period(client: ApiClient, period: Duration) -> Self {
        let (tx, rx) = watch::channel(DashboardSnapshot::default());
        let handle = tokio::spawn(async move {
            let mut view = DashboardView::new(client);
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                // errors are already recorded on the snapshot
                let _ = view.refresh().await;
                if tx.send(view.snapshot.clone()).is_err() {
                    break;
                }
            }
        });
        Self {
            handle,
            snapshots: rx,
        }
    }

    pub fn snapshots(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for DashboardPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
