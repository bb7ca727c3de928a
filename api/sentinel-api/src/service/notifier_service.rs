//! Push-only fan-out of event/violation changes to connected WebSocket clients.
//!
//! The registry is per process. When Redis is configured every published
//! envelope is also relayed on a pub/sub channel so that other API processes
//! deliver it to their own clients; frames carry the origin id so a process
//! never re-delivers its own envelopes.

use crate::infra::InfraClients;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type ClientId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewEvent,
    EventUpdated,
    NewViolation,
    ViolationUpdated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: NotificationKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RelayFrame {
    origin: String,
    envelope: Envelope,
}

/// Publishing side of the relay. The multiplexed connection is opened on the
/// first publish and shared by every later one.
#[derive(Clone)]
pub struct RedisRelay {
    client: redis::Client,
    channel: String,
    origin: String,
    publisher: Arc<OnceCell<MultiplexedConnection>>,
}

impl fmt::Debug for RedisRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRelay")
            .field("channel", &self.channel)
            .field("origin", &self.origin)
            .field("connected", &self.publisher.initialized())
            .finish()
    }
}

impl RedisRelay {
    pub fn new(infra: &InfraClients) -> Self {
        Self {
            client: infra.redis.clone(),
            channel: infra.realtime_channel.clone(),
            origin: Uuid::new_v4().to_string(),
            publisher: Arc::new(OnceCell::new()),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, String> {
        self.publisher
            .get_or_try_init(|| async {
                self.client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| format!("redis connect failed: {e}"))
            })
            .await
            .cloned()
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), String> {
        let frame = serde_json::to_string(&RelayFrame {
            origin: self.origin.clone(),
            envelope: envelope.clone(),
        })
        .map_err(|e| format!("relay frame encode failed: {e}"))?;
        let mut conn = self.connection().await?;
        let _: i64 = conn
            .publish(&self.channel, frame)
            .await
            .map_err(|e| format!("redis publish failed: {e}"))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NotifierHub {
    next_id: AtomicU64,
    clients: Mutex<HashMap<ClientId, UnboundedSender<String>>>,
    relay: Option<RedisRelay>,
}

impl NotifierHub {
    pub fn new(relay: Option<RedisRelay>) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            clients: Mutex::new(HashMap::new()),
            relay,
        }
    }

    pub fn register(&self) -> (ClientId, UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = unbounded_channel();
        self.clients().insert(id, tx);
        debug!(client_id = id, "realtime client registered");
        (id, rx)
    }

    pub fn unregister(&self, id: ClientId) {
        if self.clients().remove(&id).is_some() {
            debug!(client_id = id, "realtime client unregistered");
        }
    }

    pub fn connected_clients(&self) -> usize {
        self.clients().len()
    }

    /// Delivers to every client registered in this process and returns how
    /// many accepted the message. Clients whose receiver is gone are dropped.
    pub fn broadcast(&self, envelope: &Envelope) -> usize {
        let text = match serde_json::to_string(envelope) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "realtime envelope encode failed");
                return 0;
            }
        };
        let mut clients = self.clients();
        clients.retain(|_, tx| tx.send(text.clone()).is_ok());
        clients.len()
    }

    /// Broadcasts locally and, when configured, relays to other processes.
    pub fn publish(&self, envelope: Envelope) {
        let delivered = self.broadcast(&envelope);
        debug!(kind = ?envelope.kind, delivered, "realtime envelope published");
        if let Some(relay) = self.relay.clone() {
            tokio::spawn(async move {
                if let Err(e) = relay.publish(&envelope).await {
                    warn!(error = %e, "realtime relay publish failed");
                }
            });
        }
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientId, UnboundedSender<String>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Delivers envelopes published by other processes. Returns only when the
/// subscription ends.
pub async fn run_relay_subscriber(hub: Arc<NotifierHub>) -> Result<(), String> {
    let Some(relay) = hub.relay.clone() else {
        return Ok(());
    };
    let mut pubsub = relay
        .client
        .get_async_pubsub()
        .await
        .map_err(|e| format!("redis pubsub connect failed: {e}"))?;
    pubsub
        .subscribe(&relay.channel)
        .await
        .map_err(|e| format!("redis subscribe failed: {e}"))?;
    info!(channel = %relay.channel, "realtime relay subscribed");

    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "realtime relay payload unreadable");
                continue;
            }
        };
        match serde_json::from_str::<RelayFrame>(&payload) {
            Ok(frame) if frame.origin != relay.origin => {
                hub.broadcast(&frame.envelope);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "realtime relay frame rejected"),
        }
    }
    Err("realtime relay subscription closed".to_string())
}
