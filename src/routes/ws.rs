// WebSocket session: one duplex connection per dashboard client

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::session::{Action, RelayEnd, SessionPhase, relay_events};

type SharedSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Decrements the session count on drop (connect = +1, drop = -1).
struct SessionGuard(Arc<AtomicUsize>);

impl SessionGuard {
    fn enter(count: Arc<AtomicUsize>) -> Self {
        let active = count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(ws_clients = active, "Client connected to session");
        Self(count)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let active = self.0.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        tracing::info!(ws_clients = active, "Closing session");
    }
}

pub(super) async fn ws_session(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = run_session(socket, state).await {
            tracing::info!("Session error: {}", e);
        }
    })
}

async fn run_session(socket: WebSocket, state: AppState) -> anyhow::Result<()> {
    let _guard = SessionGuard::enter(state.ws_connections.clone());
    let send_timeout = Duration::from_secs(state.session.send_timeout_secs);
    let (sink, mut inbound) = socket.split();
    let sink: SharedSink = Arc::new(Mutex::new(sink));

    let mut ping_interval =
        tokio::time::interval(Duration::from_secs(state.session.ping_interval_secs));
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately; skip it so the first ping waits a full interval.
    ping_interval.tick().await;

    let mut phase = SessionPhase::Idle;
    // Dropping a JoinHandle detaches the task, so the relay outlives this connection.
    let mut relay: Option<JoinHandle<RelayEnd>> = None;

    while phase != SessionPhase::Closed {
        if phase == SessionPhase::StreamingEvents && relay.as_ref().is_some_and(|h| h.is_finished()) {
            phase = SessionPhase::Idle;
        }
        tokio::select! {
            next = inbound.next() => {
                let msg = match next {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "Error reading message from client");
                        break;
                    }
                    None => break,
                };
                let action = Action::from_message(&msg);
                tracing::debug!(?action, ?phase, "Received message");
                match &action {
                    Action::SendSnapshot => {
                        let metrics = state.collector.snapshot(false).await;
                        if !metrics.is_empty() {
                            let json = serde_json::to_string(&metrics)?;
                            if !send(&sink, Message::Text(json.into()), send_timeout).await {
                                break;
                            }
                        }
                    }
                    Action::StartEvents => {
                        let subscription = state.subscriptions.start();
                        let events = state.runtime.subscribe_events();
                        relay = Some(tokio::spawn(relay_events(
                            events,
                            subscription,
                            state.subscriptions.clone(),
                            sink.clone(),
                            send_timeout,
                        )));
                    }
                    Action::Reply(text) => {
                        if !send(&sink, Message::Text((*text).into()), send_timeout).await {
                            break;
                        }
                    }
                    Action::ReplyAndClose(text) => {
                        let _ = send(&sink, Message::Text((*text).into()), send_timeout).await;
                    }
                    Action::Close | Action::Ignore => {}
                }
                phase = phase.after(&action);
            }
            _ = ping_interval.tick() => {
                if !send(&sink, Message::Ping(Bytes::new()), send_timeout).await {
                    break;
                }
            }
        }
    }
    // A running relay still holds the sink, so close explicitly rather than relying on drop.
    let _ = timeout(send_timeout, async { sink.lock().await.close().await }).await;
    Ok(())
}

/// False when the client is gone or too slow.
async fn send(sink: &SharedSink, msg: Message, send_timeout: Duration) -> bool {
    let mut sink = sink.lock().await;
    matches!(timeout(send_timeout, sink.send(msg)).await, Ok(Ok(())))
}
