use std::time::Duration;

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::Result;

/// Frames the client sends to the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Subscribe { topic: String },
    Publish { destination: String, body: String },
    Heartbeat,
    /// Client is leaving; the link is closed after this
    Close,
}

/// Events the transport delivers to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Link is up, either for the first time or after a reconnect.
    /// Subscriptions do not survive a reconnect.
    Connected,
    /// Link dropped; the transport retries on its own
    Disconnected,
    Message { topic: String, body: String },
    /// Broker rejected something; the session should be abandoned
    BrokerError(String),
}

/// Both ends of one logical session
#[derive(Debug)]
pub struct TransportLink {
    pub outbound: UnboundedSender<OutboundFrame>,
    pub inbound: UnboundedReceiver<TransportEvent>,
}

/// Timing knobs a reconnecting transport works with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub reconnect_delay: Duration,
    pub heartbeat: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(5_000),
            heartbeat: Duration::from_millis(10_000),
        }
    }
}

/// Something that can open a broker session for a credential
///
/// Opening must not block. Reconnection after a drop belongs to the
/// transport; it reports it as `Disconnected` followed by `Connected`.
pub trait Transport {
    fn open(&mut self, credential: &str) -> Result<TransportLink>;

    /// Drive pending work for transports without a thread of their own.
    /// Called once per poll of the owning channel.
    fn service(&mut self) {}
}
