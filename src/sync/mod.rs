pub mod broker;
pub mod channel;
pub mod envelope;
pub mod socket;
pub mod stomp;
pub mod transport;

pub use broker::LocalBroker;
pub use channel::{ChannelRoutes, PollSummary, Publisher, SyncChannel};
pub use envelope::{decode_update, encode_send, Envelope};
pub use socket::StompTransport;
pub use stomp::StompFrame;
pub use transport::{OutboundFrame, Transport, TransportEvent, TransportLink, TransportSettings};
