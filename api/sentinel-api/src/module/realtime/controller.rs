//! Push-only WebSocket feed. Inbound frames are read only to notice closure.

use crate::app::AppState;
use crate::service::notifier_service::NotifierHub;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

pub async fn subscribe(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let hub = state.notifier.clone();
    ws.on_upgrade(move |socket| serve_client(socket, hub))
}

async fn serve_client(socket: WebSocket, hub: Arc<NotifierHub>) {
    let (client_id, mut outbound) = hub.register();
    info!(client_id, clients = hub.connected_clients(), "realtime client connected");
    let (mut sink, mut inbound) = socket.split();

    loop {
        tokio::select! {
            message = outbound.recv() => {
                let Some(text) = message else { break };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            frame = inbound.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => debug!(client_id, "ignoring inbound realtime frame"),
                }
            }
        }
    }

    hub.unregister(client_id);
    info!(client_id, "realtime client disconnected");
}
