use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::client::ClientHandle;
use crate::config::ServerConfig;
use crate::error::ProtocolError;
use crate::protocol::handle_message;
use crate::session::SharedRegistry;

/// Time the writer task gets to flush queued frames after the peer is gone.
const WRITER_GRACE: Duration = Duration::from_secs(2);

/// Runs one peer's session over an upgraded WebSocket.
///
/// - A writer task drains the handle's outbound queue into the socket.
/// - The receive loop hands each text payload to `handle_message`.
/// - On exit, for whatever reason, the client leaves its session exactly once.
///
/// Message size limits are enforced by the upgrade; an oversized message
/// surfaces here as a read error and ends the connection.
pub async fn handle_client(
    socket: WebSocket,
    client_addr: SocketAddr,
    registry: SharedRegistry,
    config: Arc<ServerConfig>,
) {
    let (mut sink, mut stream) = socket.split();
    let (client, mut outbound) = ClientHandle::channel(client_addr, config.send_queue_capacity);
    let client_id = client.id();
    info!("Client {} connected from {}", client_id, client_addr);

    let mut writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                debug!("Write to {} failed: {}", client_addr, e);
                return;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => Ok(text.as_str().to_owned()),
            Ok(Message::Binary(data)) => {
                String::from_utf8(data.to_vec()).map_err(|_| ProtocolError::NotUtf8)
            }
            Ok(Message::Close(_)) => {
                info!("Client {} sent close", client_id);
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        };

        match payload {
            Ok(text) => {
                let outcome = handle_message(&registry, &client, &text).await;
                debug!("Client {}: {:?}", client_id, outcome);
            }
            Err(e) => debug!("Dropping payload from {}: {}", client_addr, e),
        }
    }

    registry.lock().await.leave(client_id);
    drop(client);

    if tokio::time::timeout(WRITER_GRACE, &mut writer).await.is_err() {
        writer.abort();
    }
    info!("Client {} disconnected", client_id);
}
