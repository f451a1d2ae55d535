//! Per-connection task wiring
//!
//! Each WebSocket connection runs four cooperative tasks for its lifetime:
//! a receive loop (transport -> inbound queue), a dispatch loop (inbound
//! queue -> engine), the engine's change watcher, and an outbound batcher
//! (outbound queue -> transport). They are joined as a single unit: the
//! first task to fail or finish cancels the rest, and a failure closes the
//! connection with an abnormal-closure status.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use uuid::Uuid;

use crate::error::{DiffscopeError, Result};
use crate::server::engine::SessionEngine;
use crate::server::protocol::{decode_client_message, ClientMessage, ServerMessage};
use crate::server::registry::ConnectionRegistry;

/// Capacity of the inbound and outbound queues. The receive loop blocks
/// when the inbound queue is full, backpressuring a misbehaving peer.
const QUEUE_CAPACITY: usize = 10_000;

/// Outbound events per flushed frame before an immediate flush
const MAX_BATCH_SIZE: usize = 100;

/// Longest an outbound event waits before a non-empty buffer is flushed
const MAX_BATCH_DELAY: Duration = Duration::from_millis(100);

/// Serve one WebSocket connection until the client disconnects or a task
/// fails.
pub async fn handle_connection(
    stream: TcpStream,
    repos: Arc<Vec<String>>,
    registry: Arc<ConnectionRegistry>,
) {
    let ws = match accept_hdr_async(stream, require_ws_path).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::error!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let id = Uuid::new_v4();
    tracing::info!("opening connection {}", id);

    let (event_tx, mut event_rx) = mpsc::channel::<ServerMessage>(QUEUE_CAPACITY);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<ClientMessage>(QUEUE_CAPACITY);
    registry.insert(id, event_tx.clone());

    let engine = SessionEngine::new(event_tx.clone());
    let (mut ws_tx, mut ws_rx) = ws.split();

    // Initial data: the discovered repository list
    let init = event_tx
        .send(ServerMessage::Repos {
            repos: repos.as_ref().clone(),
        })
        .await;

    let result: Result<()> = if init.is_err() {
        Err(DiffscopeError::ChannelClosed)
    } else {
        // The four tasks run as one unit; whichever finishes first wins and
        // the rest are dropped. Only the receive loop finishes cleanly (on
        // client disconnect), so any Err here is a session failure.
        tokio::select! {
            r = recv_loop(&mut ws_rx, &cmd_tx) => r,
            r = dispatch_loop(&engine, &mut cmd_rx) => r,
            r = engine.watch_changes() => r,
            r = batch_loop(&mut event_rx, &mut ws_tx, MAX_BATCH_SIZE, MAX_BATCH_DELAY) => r,
        }
    };

    registry.remove(&id);

    if let Err(e) = result {
        tracing::error!("connection {} failed: {}", id, e);
        let _ = ws_tx
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Error,
                reason: "session failure".into(),
            })))
            .await;
    }

    tracing::info!("closing connection {}", id);
}

/// Reject handshakes for any path other than `/ws`.
fn require_ws_path(req: &Request, response: Response) -> std::result::Result<Response, ErrorResponse> {
    if req.uri().path() == "/ws" {
        Ok(response)
    } else {
        let mut response = ErrorResponse::new(Some("not found".to_string()));
        *response.status_mut() = StatusCode::NOT_FOUND;
        Err(response)
    }
}

/// Read one message at a time, decode it and queue the command.
///
/// Returns `Ok` on a clean client disconnect. A payload matching no known
/// shape is a decode error and therefore fatal to the connection.
async fn recv_loop(
    ws: &mut SplitStream<WebSocketStream<TcpStream>>,
    commands: &mpsc::Sender<ClientMessage>,
) -> Result<()> {
    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => {
                tracing::debug!("received message: {}", text);
                let cmd = decode_client_message(&text)?;
                commands
                    .send(cmd)
                    .await
                    .map_err(|_| DiffscopeError::ChannelClosed)?;
            }
            Message::Close(_) => return Ok(()),
            // Protocol-level ping/pong is handled by tungstenite itself
            _ => {}
        }
    }
    Ok(())
}

/// Apply queued commands in strict arrival order.
async fn dispatch_loop(
    engine: &SessionEngine,
    commands: &mut mpsc::Receiver<ClientMessage>,
) -> Result<()> {
    while let Some(cmd) = commands.recv().await {
        engine.handle_command(cmd).await?;
    }
    Ok(())
}

/// Buffer outbound events and flush them as one JSON-array text frame when
/// the buffer reaches `max_chunk` or `max_delay` elapses with a non-empty
/// buffer. Enqueue order is preserved within and across frames.
async fn batch_loop<S>(
    events: &mut mpsc::Receiver<ServerMessage>,
    ws: &mut S,
    max_chunk: usize,
    max_delay: Duration,
) -> Result<()>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut buffer: Vec<ServerMessage> = Vec::new();

    loop {
        let timed_out = match tokio::time::timeout(max_delay, events.recv()).await {
            Ok(Some(msg)) => {
                buffer.push(msg);
                false
            }
            Ok(None) => {
                // All senders gone; flush what is left and stop.
                if !buffer.is_empty() {
                    flush(&mut buffer, ws).await?;
                }
                return Ok(());
            }
            Err(_) => true,
        };

        if buffer.len() >= max_chunk || (timed_out && !buffer.is_empty()) {
            flush(&mut buffer, ws).await?;
        }
    }
}

async fn flush<S>(buffer: &mut Vec<ServerMessage>, ws: &mut S) -> Result<()>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(&buffer)?;
    tracing::debug!("sending batch of {} events", buffer.len());
    ws.send(Message::Text(text)).await?;
    buffer.clear();
    Ok(())
}
