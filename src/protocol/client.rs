use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::envelope::{Command, Inbound};
use super::transport::{Endpoint, Transport, TransportError, TransportEvent};
use crate::wirelog::{self, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// What to do after the connection drops or an attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Stay disconnected until [`SyncClient::connect`] is called again.
    #[default]
    Disabled,
    /// Retry after `initial`, doubling per failed attempt up to `max`.
    Backoff { initial: Duration, max: Duration },
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (zero-based), if retrying at all.
    pub fn delay(self, attempt: u32) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Backoff { initial, max } => {
                let factor = 2_u32.saturating_pow(attempt);
                Some(initial.saturating_mul(factor).min(max))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("not connected to the server")]
    Disconnected,

    #[error("failed to encode {cmd} command: {source}")]
    Encode {
        cmd: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Events surfaced to the session loop, in receipt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected(Option<String>),
    Message(Inbound),
}

/// Connection state machine over a [`Transport`].
///
/// Sends are fire-and-forget: nothing correlates a reply to a request and
/// nothing is queued while disconnected. Inbound frames are decoded one at a
/// time by [`poll`](Self::poll); undecodable frames are skipped.
pub struct SyncClient<T: Transport> {
    transport: T,
    endpoint: Endpoint,
    policy: ReconnectPolicy,
    state: ConnectionState,
    events: Option<Receiver<TransportEvent>>,
    pending: VecDeque<ClientEvent>,
    attempts: u32,
    retry_at: Option<Instant>,
}

impl<T: Transport> std::fmt::Debug for SyncClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("endpoint", &self.endpoint)
            .field("policy", &self.policy)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> SyncClient<T> {
    pub fn new(transport: T, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            policy: ReconnectPolicy::Disabled,
            state: ConnectionState::Disconnected,
            events: None,
            pending: VecDeque::new(),
            attempts: 0,
            retry_at: None,
        }
    }

    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// When the next reconnect attempt is due, if one is scheduled.
    pub const fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Start a connection attempt. No-op unless disconnected.
    pub fn connect(&mut self) -> Result<(), TransportError> {
        self.attempt(Instant::now())
    }

    fn attempt(&mut self, now: Instant) -> Result<(), TransportError> {
        if self.state != ConnectionState::Disconnected {
            return Ok(());
        }
        self.retry_at = None;
        self.state = ConnectionState::Connecting;
        info!(url = %self.endpoint.url(), "connecting");
        let (tx, rx) = mpsc::channel();
        match self.transport.open(&self.endpoint, tx) {
            Ok(()) => {
                self.events = Some(rx);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "connection attempt failed");
                self.state = ConnectionState::Disconnected;
                self.schedule_retry(now);
                Err(err)
            }
        }
    }

    /// Hand a command to the transport.
    pub fn send(&mut self, command: &Command) -> Result<(), SendError> {
        if self.state != ConnectionState::Connected {
            return Err(SendError::Disconnected);
        }
        let frame = command.encode().map_err(|source| SendError::Encode {
            cmd: command.name(),
            source,
        })?;
        debug!(cmd = command.name(), "sending command");
        wirelog::log_frame(Direction::Sent, &frame);
        if let Err(err) = self.transport.send(&frame) {
            let event = self.handle_closed(Some(err.to_string()), Instant::now());
            self.pending.push_back(event);
            return Err(err.into());
        }
        Ok(())
    }

    /// Next event, without blocking.
    pub fn poll(&mut self) -> Option<ClientEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        loop {
            let event = match self.events.as_ref()?.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => TransportEvent::Closed(None),
            };
            match event {
                TransportEvent::Opened => {
                    self.state = ConnectionState::Connected;
                    self.attempts = 0;
                    info!(url = %self.endpoint.url(), "connected");
                    return Some(ClientEvent::Connected);
                }
                TransportEvent::Frame(frame) => {
                    wirelog::log_frame(Direction::Received, &frame);
                    if let Some(message) = Inbound::decode(&frame) {
                        debug!(cmd = message.name(), "received command");
                        return Some(ClientEvent::Message(message));
                    }
                }
                TransportEvent::Closed(reason) => {
                    return Some(self.handle_closed(reason, Instant::now()));
                }
            }
        }
    }

    /// Drive the reconnect policy. Returns `true` if an attempt was made.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.retry_at {
            Some(at) if self.state == ConnectionState::Disconnected && now >= at => {
                let _ = self.attempt(now);
                true
            }
            _ => false,
        }
    }

    /// Close the connection. No reconnect is scheduled.
    pub fn disconnect(&mut self) {
        self.transport.close();
        self.events = None;
        self.retry_at = None;
        if self.state != ConnectionState::Disconnected {
            info!("disconnected by client");
        }
        self.state = ConnectionState::Disconnected;
    }

    fn handle_closed(&mut self, reason: Option<String>, now: Instant) -> ClientEvent {
        self.transport.close();
        self.events = None;
        self.state = ConnectionState::Disconnected;
        match &reason {
            Some(reason) => warn!(%reason, "connection lost"),
            None => info!("connection closed"),
        }
        self.schedule_retry(now);
        ClientEvent::Disconnected(reason)
    }

    fn schedule_retry(&mut self, now: Instant) {
        if let Some(delay) = self.policy.delay(self.attempts) {
            self.attempts = self.attempts.saturating_add(1);
            self.retry_at = Some(now + delay);
            debug!(?delay, "reconnect scheduled");
        }
    }
}
