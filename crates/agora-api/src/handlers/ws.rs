//! WebSocket upgrade handler: the transport adapter between sockets and
//! the real-time engine.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use agora_realtime::connection::Frame;
use agora_realtime::connection::heartbeat::run_heartbeat;

use crate::state::AppState;

/// How long the writer may take to flush its close frame after teardown.
const WRITER_DRAIN: Duration = Duration::from_secs(1);

/// GET /ws: WebSocket upgrade
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let engine = state.realtime;

    let (handle, mut outbound_rx) = match engine.open_connection() {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "Refused WebSocket connection");
            return;
        }
    };
    let conn_id = handle.id;
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!(conn_id = %conn_id, "WebSocket connection established");

    // Outbound frame forwarder
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let (message, last) = match frame {
                Frame::Text(text) => (Message::Text(text.into()), false),
                Frame::Ping => (Message::Ping(Bytes::new()), false),
                Frame::Close => (Message::Close(None), true),
            };
            if ws_tx.send(message).await.is_err() || last {
                break;
            }
        }
    });
    let mut writer_done = false;

    let heartbeat = run_heartbeat(handle.clone(), engine.heartbeat_config());
    tokio::pin!(heartbeat);
    let mut shutdown = engine.shutdown_receiver();

    loop {
        tokio::select! {
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = engine.router.handle_inbound(conn_id, text.as_str());
                }
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => {
                        let _ = engine.router.handle_inbound(conn_id, text);
                    }
                    Err(_) => debug!(conn_id = %conn_id, "Ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Pong(_))) => handle.record_pong().await,
                // Pings are answered by axum
                Some(Ok(Message::Ping(_))) => {}
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            () = &mut heartbeat => break,
            _ = shutdown.recv() => break,
            _ = &mut writer => {
                writer_done = true;
                break;
            }
        }
    }

    engine.close_connection(&conn_id);
    if !writer_done && tokio::time::timeout(WRITER_DRAIN, &mut writer).await.is_err() {
        writer.abort();
    }

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
