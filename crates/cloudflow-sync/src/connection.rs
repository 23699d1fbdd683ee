//! Push-channel connection lifecycle.
//!
//! One background task owns the socket: it dials, pumps inbound text frames
//! through the dispatcher, and on abnormal close retries with linear
//! backoff (attempt N waits N times the base delay) up to a fixed attempt
//! budget. A clean session resets the attempt counter, so every outage
//! gets the full budget. Explicit teardown is terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cloudflow_core::events::decode_frame;
use cloudflow_core::ids::ClientId;
use cloudflow_settings::SyncSettings;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::EventDispatcher;

// ─────────────────────────────────────────────────────────────────────────────
// ConnectionStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Observable lifecycle state of the push channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection has been requested yet.
    Idle,
    /// A dial is in flight.
    Connecting,
    /// The channel is live and pumping frames.
    Open,
    /// Waiting out a backoff delay before the next dial.
    Reconnecting,
    /// Torn down by an explicit disconnect. Terminal.
    Closed,
    /// The reconnect budget is exhausted. Terminal until reconnected
    /// explicitly.
    Failed,
}

impl ConnectionStatus {
    /// Whether frames are currently flowing.
    #[must_use]
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ReconnectPolicy
// ─────────────────────────────────────────────────────────────────────────────

/// Linear-backoff reconnect schedule.
///
/// Attempt N (1-based) waits N times the base delay. Once the budget is
/// spent, [`next_delay`](Self::next_delay) returns `None` until a
/// successful session calls [`reset`](Self::reset).
#[derive(Clone, Debug)]
pub struct ReconnectPolicy {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl ReconnectPolicy {
    /// Build a policy with the given budget and base delay.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Consume one attempt and return its backoff delay, or `None` when
    /// the budget is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.base_delay * self.attempts)
    }

    /// Restore the full budget after a successful session.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts consumed since the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConnectionManager
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the push-channel socket task.
pub struct ConnectionManager {
    url: String,
    max_attempts: u32,
    base_delay: Duration,
    dispatcher: EventDispatcher,
    status_tx: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
    decode_failures: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Build a manager for `client_id` against the configured endpoint.
    ///
    /// Nothing is dialed until [`connect`](Self::connect).
    #[must_use]
    pub fn new(settings: &SyncSettings, client_id: &ClientId, dispatcher: EventDispatcher) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Idle);
        Self {
            url: format!("{}/{client_id}", settings.ws_endpoint.trim_end_matches('/')),
            max_attempts: settings.max_reconnect_attempts,
            base_delay: settings.base_retry_delay(),
            dispatcher,
            status_tx,
            cancel: CancellationToken::new(),
            decode_failures: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    /// Start the connection task. No-op while a task is already live;
    /// after exhaustion ([`ConnectionStatus::Failed`]) it starts over with
    /// a fresh backoff budget. No-op after an explicit disconnect.
    pub fn connect(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let url = self.url.clone();
        let dispatcher = self.dispatcher.clone();
        let status_tx = self.status_tx.clone();
        let cancel = self.cancel.clone();
        let decode_failures = Arc::clone(&self.decode_failures);
        let policy = ReconnectPolicy::new(self.max_attempts, self.base_delay);
        *task = Some(tokio::spawn(run_channel(
            url,
            dispatcher,
            status_tx,
            cancel,
            decode_failures,
            policy,
        )));
    }

    /// Tear the channel down. Terminal: any in-flight dial or backoff wait
    /// is abandoned and later [`connect`](Self::connect) calls are no-ops.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }

    /// Watch the connection lifecycle.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Frames dropped because they failed to decode. Decode failures are
    /// logged and counted but never tear the connection down.
    #[must_use]
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// The resolved endpoint URL, client id included.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(PartialEq)]
enum SessionEnd {
    LocalClose,
    RemoteClose,
}

async fn run_channel(
    url: String,
    dispatcher: EventDispatcher,
    status_tx: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
    decode_failures: Arc<AtomicU64>,
    mut policy: ReconnectPolicy,
) {
    loop {
        let _ = status_tx.send_replace(ConnectionStatus::Connecting);
        let dial = tokio::select! {
            () = cancel.cancelled() => {
                let _ = status_tx.send_replace(ConnectionStatus::Closed);
                return;
            }
            dial = connect_async(&url) => dial,
        };
        match dial {
            Ok((stream, _response)) => {
                policy.reset();
                let _ = status_tx.send_replace(ConnectionStatus::Open);
                info!(%url, "push channel open");
                if pump_frames(stream, &dispatcher, &decode_failures, &cancel).await
                    == SessionEnd::LocalClose
                {
                    let _ = status_tx.send_replace(ConnectionStatus::Closed);
                    info!("push channel closed");
                    return;
                }
                warn!("push channel dropped by peer");
            }
            Err(err) => {
                warn!(%url, error = %err, "push channel dial failed");
            }
        }
        match policy.next_delay() {
            Some(delay) => {
                let _ = status_tx.send_replace(ConnectionStatus::Reconnecting);
                debug!(attempt = policy.attempts(), ?delay, "reconnect scheduled");
                tokio::select! {
                    () = cancel.cancelled() => {
                        let _ = status_tx.send_replace(ConnectionStatus::Closed);
                        return;
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
            None => {
                error!(
                    attempts = policy.attempts(),
                    "reconnect budget exhausted, giving up"
                );
                let _ = status_tx.send_replace(ConnectionStatus::Failed);
                return;
            }
        }
    }
}

async fn pump_frames<S>(
    mut stream: S,
    dispatcher: &EventDispatcher,
    decode_failures: &AtomicU64,
    cancel: &CancellationToken,
) -> SessionEnd
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            () = cancel.cancelled() => return SessionEnd::LocalClose,
            frame = stream.next() => frame,
        };
        match frame {
            Some(Ok(Message::Text(text))) => match decode_frame(text.as_str()) {
                Ok(event) => {
                    let _ = dispatcher.publish(event);
                }
                Err(err) => {
                    let _ = decode_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %err, "dropping undecodable frame");
                }
            },
            // The channel is receive-only; control frames are answered by
            // the protocol layer.
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Close(_))) | None => return SessionEnd::RemoteClose,
            Some(Err(err)) => {
                warn!(error = %err, "push channel read error");
                return SessionEnd::RemoteClose;
            }
        }
    }
}
