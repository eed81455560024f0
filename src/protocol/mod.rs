//! Synchronization protocol with the note server.
//!
//! Both directions carry `{cmd, content}` envelopes. Outbound commands are
//! fire-and-forget; inbound messages are consumed as one ordered queue.

mod client;
mod envelope;
mod slug;
mod transport;

pub use client::{ClientEvent, ConnectionState, ReconnectPolicy, SendError, SyncClient};
pub use envelope::{Command, DocumentPayload, Envelope, Inbound, SaveRequest};
pub use slug::normalize_identifier;
pub use transport::{
    ChannelTransport, Endpoint, ServerHandle, Transport, TransportError, TransportEvent,
    WsTransport,
};
