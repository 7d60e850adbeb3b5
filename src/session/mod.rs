// Session protocol: what each inbound WebSocket frame asks the server to do

mod relay;
mod subscription;

pub use relay::{RelayEnd, relay_events};
pub use subscription::{Subscription, SubscriptionSlot};

use axum::extract::ws::Message;

pub const UNKNOWN_COMMAND: &str = "unknown command";
pub const BINARY_UNSUPPORTED: &str = "server doesn't support binary messages";

/// Where a connection is. Reads continue while events stream, so both live states accept commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    StreamingEvents,
    Closed,
}

/// The server's reaction to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Reply with one JSON array of running-container metrics (nothing when empty).
    SendSnapshot,
    /// Take over the process-wide subscription slot and relay runtime events.
    StartEvents,
    Reply(&'static str),
    /// Send one text frame, then drop the connection.
    ReplyAndClose(&'static str),
    Close,
    Ignore,
}

impl Action {
    pub fn from_message(msg: &Message) -> Self {
        match msg {
            Message::Text(text) => match text.as_str() {
                "stats" => Action::SendSnapshot,
                "events" => Action::StartEvents,
                _ => Action::Reply(UNKNOWN_COMMAND),
            },
            Message::Binary(_) => Action::ReplyAndClose(BINARY_UNSUPPORTED),
            Message::Close(_) => Action::Close,
            Message::Ping(_) | Message::Pong(_) => Action::Ignore,
        }
    }
}

impl SessionPhase {
    /// Phase after `action` has been handled successfully.
    pub fn after(self, action: &Action) -> Self {
        match (self, action) {
            (SessionPhase::Closed, _) => SessionPhase::Closed,
            (_, Action::ReplyAndClose(_) | Action::Close) => SessionPhase::Closed,
            (_, Action::StartEvents) => SessionPhase::StreamingEvents,
            (phase, _) => phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn text_commands_map_to_actions() {
        assert_eq!(
            Action::from_message(&Message::Text("stats".into())),
            Action::SendSnapshot
        );
        assert_eq!(
            Action::from_message(&Message::Text("events".into())),
            Action::StartEvents
        );
    }

    #[test]
    fn unknown_text_gets_unknown_command_reply() {
        assert_eq!(
            Action::from_message(&Message::Text("ping".into())),
            Action::Reply(UNKNOWN_COMMAND)
        );
        assert_eq!(
            Action::from_message(&Message::Text("STATS".into())),
            Action::Reply(UNKNOWN_COMMAND)
        );
    }

    #[test]
    fn binary_frames_are_rejected_whatever_their_content() {
        for payload in [Bytes::new(), Bytes::from_static(b"stats")] {
            assert_eq!(
                Action::from_message(&Message::Binary(payload)),
                Action::ReplyAndClose(BINARY_UNSUPPORTED)
            );
        }
    }

    #[test]
    fn control_frames() {
        assert_eq!(Action::from_message(&Message::Close(None)), Action::Close);
        assert_eq!(
            Action::from_message(&Message::Ping(Bytes::new())),
            Action::Ignore
        );
        assert_eq!(
            Action::from_message(&Message::Pong(Bytes::new())),
            Action::Ignore
        );
    }

    #[test]
    fn phase_transitions() {
        let idle = SessionPhase::Idle;
        assert_eq!(idle.after(&Action::SendSnapshot), SessionPhase::Idle);
        assert_eq!(idle.after(&Action::Reply(UNKNOWN_COMMAND)), SessionPhase::Idle);
        let streaming = idle.after(&Action::StartEvents);
        assert_eq!(streaming, SessionPhase::StreamingEvents);
        assert_eq!(
            streaming.after(&Action::SendSnapshot),
            SessionPhase::StreamingEvents
        );
        for phase in [SessionPhase::Idle, SessionPhase::StreamingEvents] {
            assert_eq!(
                phase.after(&Action::ReplyAndClose(BINARY_UNSUPPORTED)),
                SessionPhase::Closed
            );
        }
        assert_eq!(
            SessionPhase::Closed.after(&Action::StartEvents),
            SessionPhase::Closed
        );
    }
}
