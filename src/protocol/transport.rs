//! Byte-level connection to the note server.
//!
//! A [`Transport`] only moves frames. It reports everything that happens on
//! the connection (open, frame, close) as [`TransportEvent`]s on the channel it
//! was opened with, so the client sees a single ordered queue.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tungstenite::{Message, WebSocket};

use super::envelope::Envelope;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error("connection closed")]
    Closed,

    #[error("not connected")]
    NotConnected,
}

/// Something that happened on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    /// The connection ended, with a reason when there was an error.
    Closed(Option<String>),
}

/// Where to connect: a server address and a path scoped by a subpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub server: String,
    pub path: String,
}

impl Endpoint {
    pub fn new(server: impl Into<String>, subpath: &str) -> Self {
        Self {
            server: server.into(),
            path: format!("/__fuzzy/{}", subpath.trim_start_matches('/')),
        }
    }

    /// WebSocket URL of the endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}{}", self.server, self.path)
    }
}

pub trait Transport {
    /// Open a connection. On success `Opened` is delivered on `events`,
    /// followed by frames and finally `Closed`.
    fn open(
        &mut self,
        endpoint: &Endpoint,
        events: Sender<TransportEvent>,
    ) -> Result<(), TransportError>;

    /// Write one frame. Never blocks waiting for a reply.
    fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    fn close(&mut self);
}

/// JSON envelopes as WebSocket text frames over a plain TCP connection.
///
/// One I/O thread owns the socket: it writes frames handed over by
/// [`send`](Transport::send) and forwards every text frame it reads.
#[derive(Debug, Default)]
pub struct WsTransport {
    outgoing: Option<Sender<String>>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for WsTransport {
    fn open(
        &mut self,
        endpoint: &Endpoint,
        events: Sender<TransportEvent>,
    ) -> Result<(), TransportError> {
        self.close();
        let addr = endpoint
            .server
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "server address did not resolve")
            })?;
        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        let url = endpoint.url();
        let (socket, _response) = tungstenite::client::client(url.as_str(), stream)
            .map_err(|err| TransportError::Handshake(err.to_string()))?;
        // Reads time out so the I/O thread can interleave writes.
        socket.get_ref().set_read_timeout(Some(POLL_INTERVAL))?;

        let (outgoing, frames) = mpsc::channel();
        let _ = events.send(TransportEvent::Opened);
        spawn_io_thread(socket, frames, events);
        self.outgoing = Some(outgoing);
        Ok(())
    }

    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        let outgoing = self.outgoing.as_ref().ok_or(TransportError::NotConnected)?;
        outgoing
            .send(frame.to_string())
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        // The I/O thread sends a close frame once its queue is gone.
        self.outgoing = None;
    }
}

/// Pump the socket until either side closes, forwarding text frames.
fn spawn_io_thread(
    mut socket: WebSocket<TcpStream>,
    frames: Receiver<String>,
    events: Sender<TransportEvent>,
) {
    thread::spawn(move || {
        loop {
            loop {
                match frames.try_recv() {
                    Ok(frame) => {
                        if let Err(err) = socket.send(Message::text(frame)) {
                            let _ = events.send(TransportEvent::Closed(Some(err.to_string())));
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        let _ = socket.close(None);
                        let _ = socket.flush();
                        return;
                    }
                }
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    let frame = text.as_str().to_owned();
                    if events.send(TransportEvent::Frame(frame)).is_err() {
                        return;
                    }
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(err))
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    let _ = events.send(TransportEvent::Closed(None));
                    return;
                }
                Err(err) => {
                    let _ = events.send(TransportEvent::Closed(Some(err.to_string())));
                    return;
                }
            }
        }
    });
}

#[derive(Debug, Default)]
struct Shared {
    events: Option<Sender<TransportEvent>>,
    sent: Vec<String>,
    opened_paths: Vec<String>,
    refuse: bool,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process transport. The paired [`ServerHandle`] plays the server.
#[derive(Debug)]
pub struct ChannelTransport {
    shared: Arc<Mutex<Shared>>,
}

/// Server side of a [`ChannelTransport`].
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shared: Arc<Mutex<Shared>>,
}

impl ChannelTransport {
    pub fn pair() -> (Self, ServerHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            ServerHandle { shared },
        )
    }
}

impl Transport for ChannelTransport {
    fn open(
        &mut self,
        endpoint: &Endpoint,
        events: Sender<TransportEvent>,
    ) -> Result<(), TransportError> {
        let mut shared = lock(&self.shared);
        if shared.refuse {
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
        }
        shared.opened_paths.push(endpoint.path.clone());
        let _ = events.send(TransportEvent::Opened);
        shared.events = Some(events);
        Ok(())
    }

    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        let mut shared = lock(&self.shared);
        if shared.events.is_none() {
            return Err(TransportError::NotConnected);
        }
        shared.sent.push(frame.to_string());
        Ok(())
    }

    fn close(&mut self) {
        lock(&self.shared).events = None;
    }
}

impl ServerHandle {
    /// Deliver a raw frame to the client. Returns `false` when not connected.
    pub fn push(&self, frame: impl Into<String>) -> bool {
        lock(&self.shared)
            .events
            .as_ref()
            .is_some_and(|events| events.send(TransportEvent::Frame(frame.into())).is_ok())
    }

    /// Deliver a `{cmd, content}` envelope.
    pub fn push_command(&self, cmd: &str, content: Value) -> bool {
        let envelope = Envelope {
            cmd: cmd.to_string(),
            content,
        };
        match serde_json::to_string(&envelope) {
            Ok(frame) => self.push(frame),
            Err(_) => false,
        }
    }

    /// Frames the client has sent so far.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.shared).sent.clone()
    }

    /// Drain the sent frames, decoded as envelopes. Undecodable frames are skipped.
    pub fn take_sent(&self) -> Vec<Envelope> {
        std::mem::take(&mut lock(&self.shared).sent)
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }

    /// Paths the client opened, in order.
    pub fn opened_paths(&self) -> Vec<String> {
        lock(&self.shared).opened_paths.clone()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.shared).events.is_some()
    }

    /// Close the connection from the server side.
    pub fn drop_connection(&self) {
        if let Some(events) = lock(&self.shared).events.take() {
            let _ = events.send(TransportEvent::Closed(None));
        }
    }

    /// Make further connection attempts fail.
    pub fn refuse_connections(&self, refuse: bool) {
        lock(&self.shared).refuse = refuse;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tungstenite::handshake::server::{ErrorResponse, Request, Response};

    #[test]
    fn test_endpoint_path() {
        let endpoint = Endpoint::new("127.0.0.1:9020", "work");
        assert_eq!(endpoint.path, "/__fuzzy/work");
        assert_eq!(endpoint.url(), "ws://127.0.0.1:9020/__fuzzy/work");
        assert_eq!(Endpoint::new("h:1", "").path, "/__fuzzy/");
        assert_eq!(Endpoint::new("h:1", "/a/b").path, "/__fuzzy/a/b");
    }

    #[test]
    fn test_channel_transport_round_trip() {
        let (mut transport, server) = ChannelTransport::pair();
        let (tx, rx) = mpsc::channel();
        transport.open(&Endpoint::new("mem", "x"), tx).unwrap();
        assert_eq!(rx.try_recv().unwrap(), TransportEvent::Opened);
        assert_eq!(server.opened_paths(), vec!["/__fuzzy/x".to_string()]);

        transport.send("hello").unwrap();
        assert_eq!(server.sent(), vec!["hello".to_string()]);

        assert!(server.push("frame"));
        assert_eq!(rx.try_recv().unwrap(), TransportEvent::Frame("frame".to_string()));

        server.drop_connection();
        assert_eq!(rx.try_recv().unwrap(), TransportEvent::Closed(None));
        assert!(matches!(transport.send("late"), Err(TransportError::NotConnected)));
    }

    #[test]
    fn test_channel_transport_refuses() {
        let (mut transport, server) = ChannelTransport::pair();
        server.refuse_connections(true);
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            transport.open(&Endpoint::new("mem", ""), tx),
            Err(TransportError::Io(_))
        ));
    }

    #[test]
    fn test_ws_transport_handshake_and_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut path = String::new();
            let record_path = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                path = req.uri().path().to_string();
                Ok(resp)
            };
            let mut socket = tungstenite::accept_hdr(stream, record_path).unwrap();
            let frame = socket.read().unwrap();
            socket
                .send(Message::text(r#"{"cmd":"results","content":[]}"#))
                .unwrap();
            (path, frame)
        });

        let mut transport = WsTransport::new();
        let (tx, rx) = mpsc::channel();
        transport
            .open(&Endpoint::new(addr.to_string(), "notes"), tx)
            .unwrap();
        transport.send(r#"{"cmd":"query","content":"x"}"#).unwrap();

        let (path, frame) = server.join().unwrap();
        assert_eq!(path, "/__fuzzy/notes");
        assert_eq!(frame, Message::text(r#"{"cmd":"query","content":"x"}"#));

        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), TransportEvent::Opened);
        assert_eq!(
            rx.recv_timeout(timeout).unwrap(),
            TransportEvent::Frame(r#"{"cmd":"results","content":[]}"#.to_string())
        );
        assert!(matches!(
            rx.recv_timeout(timeout).unwrap(),
            TransportEvent::Closed(_)
        ));
        transport.close();
    }

    #[test]
    fn test_ws_transport_reports_failed_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut transport = WsTransport::new();
        let (tx, rx) = mpsc::channel();
        let result = transport.open(&Endpoint::new(addr.to_string(), ""), tx);
        server.join().unwrap();
        assert!(matches!(result, Err(TransportError::Handshake(_))));
        assert!(rx.try_recv().is_err());
        assert!(matches!(transport.send("x"), Err(TransportError::NotConnected)));
    }
}
