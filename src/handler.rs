//! WebSocket connection handler
//!
//! Upgrades `/ws` requests, registers the client and pumps events between
//! the socket and the dispatcher until either side goes away or the
//! registry drops the connection.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::message::{ClientEvent, ServerEvent};

/// Outbound queue size per connection
const OUTBOUND_BUFFER_SIZE: usize = 32;

/// Time the write task gets to flush and send a close frame on a clean exit
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// GET /ws
/// WebSocket upgrade endpoint.
pub async fn ws_upgrade(
    State(dispatcher): State<Dispatcher>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_socket(socket, peer_addr, dispatcher).await {
            error!("Connection handler error: {}", e);
        }
    })
}

/// Run a WebSocket session
pub async fn handle_socket(
    socket: WebSocket,
    peer_addr: SocketAddr,
    dispatcher: Dispatcher,
) -> Result<(), AppError> {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel for server -> client events; the registry owns the sender
    let (event_tx, mut event_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER_SIZE);

    let registry = dispatcher.registry().clone();
    let registration = match registry.register(event_tx).await {
        Ok(registration) => registration,
        Err(e) => {
            error!("Failed to register connection from {}: {}", peer_addr, e);
            let _ = ws_sender.close().await;
            return Err(e.into());
        }
    };
    let conn_id = registration.id;
    let closed = registration.closed;
    info!("Client {} connected from {}", conn_id, peer_addr);

    // Written before the writer task starts, so it always arrives first
    let connected = ServerEvent::Connected {
        id: conn_id.to_string(),
    };
    let json = serde_json::to_string(&connected)?;
    if let Err(e) = ws_sender.send(Message::Text(json.into())).await {
        registry.unregister(conn_id).await;
        return Err(e.into());
    }

    // Spawn read task (WebSocket -> Dispatcher)
    let read_closed = closed.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            // Dropped connections relay nothing more
            if read_closed.is_cancelled() {
                break;
            }
            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::ChatMessage(payload)) => {
                        dispatcher.on_message(conn_id, payload).await;
                    }
                    Err(e) => {
                        warn!("Invalid event from {}: {}", conn_id, e);
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", conn_id);
                    break;
                }
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by axum
                    debug!("Ping from {}", conn_id);
                }
                Ok(_) => {
                    // Binary and other frames carry no events
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", conn_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", conn_id);
    });

    // Spawn write task (ServerEvent -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                }
            }
        }
        debug!("Write task ended for {}", conn_id);

        // Send close frame when done
        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete, or for the registry to drop us
    let (dropped, write_done) = tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", conn_id);
            (false, false)
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", conn_id);
            (false, true)
        }
        _ = closed.cancelled() => {
            warn!("Client {} dropped after failed delivery", conn_id);
            (true, false)
        }
    };

    read_task.abort();

    // Dropping the registry's sender lets the write task drain and close
    registry.unregister(conn_id).await;

    // A dropped client's socket is stalled; don't wait on it
    if !write_done
        && (dropped || tokio::time::timeout(CLOSE_TIMEOUT, &mut write_task).await.is_err())
    {
        write_task.abort();
    }

    info!("Client {} disconnected", conn_id);

    Ok(())
}
