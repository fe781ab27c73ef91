//! Live update push channel.
//!
//! Best-effort WebSocket connection to the alerting hub. Pushed
//! fragments reach the UI loop over a channel and are applied through
//! the poller's shared apply routine, so the push path obeys the same
//! sequencing rule as the poll path. The socket reconnects forever
//! with capped backoff; its failures never touch the poll cycle.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::fragment::AlertFragment;

/// Connection state of the push channel, owned by the socket task and
/// mirrored in the UI via [`SocketEvent`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub last_error: Option<String>,
}

impl ConnectionState {
    /// Fold a socket event into the state.
    pub fn observe(&mut self, event: &SocketEvent) {
        match event {
            SocketEvent::Connected => {
                self.connected = true;
                self.last_error = None;
            }
            SocketEvent::Disconnected { error } => {
                self.connected = false;
                self.last_error = error.clone();
            }
            SocketEvent::Fragment(_) => {}
        }
    }
}

/// Events emitted by the socket task.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// The connection opened.
    Connected,
    /// The connection dropped or failed to open.
    Disconnected { error: Option<String> },
    /// The server pushed an alert fragment.
    Fragment(AlertFragment),
}

/// The live update socket task.
pub struct LiveSocket {
    url: String,
    backoff: BackoffPolicy,
}

impl LiveSocket {
    /// Create a socket for the given `ws://`/`wss://` URL.
    pub fn new(url: impl Into<String>, backoff: BackoffPolicy) -> Self {
        Self {
            url: url.into(),
            backoff,
        }
    }

    /// Run the connect/read/reconnect loop until the receiver side of
    /// `tx` is dropped.
    pub async fn run(self, tx: mpsc::UnboundedSender<SocketEvent>) {
        let mut consecutive_failures: u32 = 0;

        loop {
            match connect_async(&self.url).await {
                Ok((mut stream, _response)) => {
                    info!(url = %self.url, "live socket connected");
                    consecutive_failures = 0;
                    if tx.send(SocketEvent::Connected).is_err() {
                        return;
                    }

                    let close_error = loop {
                        match stream.next().await {
                            Some(Ok(message)) => {
                                if let Some(event) = decode_message(&message) {
                                    if tx.send(event).is_err() {
                                        return;
                                    }
                                }
                                if matches!(message, Message::Close(_)) {
                                    break None;
                                }
                            }
                            Some(Err(e)) => break Some(e.to_string()),
                            None => break None,
                        }
                    };

                    warn!(url = %self.url, error = ?close_error, "live socket closed");
                    if tx
                        .send(SocketEvent::Disconnected { error: close_error })
                        .is_err()
                    {
                        return;
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(url = %self.url, error = %e, "live socket connect failed");
                    if tx
                        .send(SocketEvent::Disconnected {
                            error: Some(e.to_string()),
                        })
                        .is_err()
                    {
                        return;
                    }
                }
            }

            consecutive_failures = consecutive_failures.max(1);
            let delay = self.backoff.delay_after(consecutive_failures);
            debug!(delay_ms = delay.as_millis() as u64, "reconnecting live socket");
            tokio::time::sleep(delay).await;

            if tx.is_closed() {
                return;
            }
        }
    }
}

/// Decode one wire message into a socket event.
///
/// Only JSON text messages carrying an `alerts` payload become
/// fragments; everything else is ignored.
fn decode_message(message: &Message) -> Option<SocketEvent> {
    let text = match message {
        Message::Text(text) => text.as_str(),
        _ => return None,
    };

    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "ignoring non-JSON socket message");
            return None;
        }
    };

    let alerts = value.get("alerts")?;
    match serde_json::from_value::<AlertFragment>(alerts.clone()) {
        Ok(fragment) => Some(SocketEvent::Fragment(fragment)),
        Err(e) => {
            debug!(error = %e, "ignoring malformed alerts payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_alerts_payload() {
        let message = Message::text(
            r#"{"alerts": {"markup": "<tr data-fingerprint=\"x\"></tr>",
                          "count": 1,
                          "timestamp": "2025-06-01T12:00:00Z"}}"#,
        );
        match decode_message(&message) {
            Some(SocketEvent::Fragment(fragment)) => {
                assert_eq!(fragment.count, 1);
                assert!(fragment.fingerprints().contains("x"));
            }
            other => panic!("expected fragment, got {other:?}"),
        }
    }

    #[test]
    fn test_non_alert_messages_ignored() {
        assert!(decode_message(&Message::text(r#"{"message": "hello"}"#)).is_none());
        assert!(decode_message(&Message::text("not json")).is_none());
        assert!(decode_message(&Message::Binary(vec![1, 2, 3].into())).is_none());
    }

    #[test]
    fn test_malformed_alerts_payload_ignored() {
        let message = Message::text(r#"{"alerts": {"count": "not a number"}}"#);
        assert!(decode_message(&message).is_none());
    }

    #[test]
    fn test_connection_state_tracking() {
        let mut state = ConnectionState::default();
        state.observe(&SocketEvent::Connected);
        assert!(state.connected);

        state.observe(&SocketEvent::Disconnected {
            error: Some("reset".to_string()),
        });
        assert!(!state.connected);
        assert_eq!(state.last_error.as_deref(), Some("reset"));

        state.observe(&SocketEvent::Connected);
        assert!(state.last_error.is_none());
    }
}
