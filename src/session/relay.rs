// Event relay: forwards runtime events to one connection until cancelled

use super::subscription::{Subscription, SubscriptionSlot};
use crate::docker_repo::RuntimeError;
use axum::extract::ws::Message;
use bollard::models::EventMessage;
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, timeout};

/// Why a relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    Cancelled,
    SourceError,
    SourceEnded,
    SendFailed,
}

/// Runs until the subscription is cancelled, the event source fails or ends, or a send fails.
/// The slot is released on the way out unless a newer subscription already took it.
pub async fn relay_events<S>(
    mut events: BoxStream<'static, Result<EventMessage, RuntimeError>>,
    mut subscription: Subscription,
    slot: Arc<SubscriptionSlot>,
    sink: Arc<Mutex<S>>,
    send_timeout: Duration,
) -> RelayEnd
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    let id = subscription.id();
    tracing::debug!(subscription = id, "Event relay started");
    let end = loop {
        tokio::select! {
            biased;
            _ = subscription.cancelled() => break RelayEnd::Cancelled,
            next = events.next() => match next {
                Some(Ok(event)) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "encode_event", "Skipping unencodable event");
                            continue;
                        }
                    };
                    let mut sink = sink.lock().await;
                    // Superseded while waiting for the connection's sink.
                    if subscription.is_cancelled() {
                        break RelayEnd::Cancelled;
                    }
                    match timeout(send_timeout, sink.send(Message::Text(json.into()))).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            tracing::debug!(error = %e, subscription = id, "Event send failed");
                            break RelayEnd::SendFailed;
                        }
                        Err(_) => break RelayEnd::SendFailed,
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, operation = "subscribe_events", "Docker event stream failed");
                    break RelayEnd::SourceError;
                }
                None => break RelayEnd::SourceEnded,
            },
        }
    };
    slot.release(id);
    tracing::debug!(subscription = id, reason = ?end, "Event relay stopped");
    end
}
