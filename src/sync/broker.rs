use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{FutureExt, StreamExt};

use super::channel::ChannelRoutes;
use super::envelope::{Envelope, KIND_SEND};
use super::transport::{OutboundFrame, Transport, TransportEvent, TransportLink, TransportSettings};
use crate::error::{CanvasError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Online,
    Dropped { since: Instant },
    Closed,
}

struct Client {
    frames: UnboundedReceiver<OutboundFrame>,
    events: UnboundedSender<TransportEvent>,
    subscriptions: HashSet<String>,
    state: LinkState,
}

impl Client {
    fn deliver(&mut self, event: TransportEvent) {
        if self.events.unbounded_send(event).is_err() {
            self.state = LinkState::Closed;
        }
    }
}

struct BrokerState {
    routes: ChannelRoutes,
    settings: TransportSettings,
    clients: Vec<Client>,
}

/// In-process message broker
///
/// Relays `send` envelopes published to the destination as `get`
/// broadcasts on the topic, to every subscribed client including the
/// sender. Dropped links come back after the reconnect delay, like a
/// reconnecting network transport. Clones share the same broker.
#[derive(Clone)]
pub struct LocalBroker {
    inner: Rc<RefCell<BrokerState>>,
}

impl LocalBroker {
    pub fn new(routes: ChannelRoutes, settings: TransportSettings) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BrokerState {
                routes,
                settings,
                clients: Vec::new(),
            })),
        }
    }

    /// Process every queued client frame and deliver resulting broadcasts.
    /// Returns how many messages were delivered.
    pub fn pump(&self) -> usize {
        let mut state = self.inner.borrow_mut();
        let BrokerState { routes, settings, clients } = &mut *state;
        let now = Instant::now();
        let mut broadcasts = Vec::new();

        for client in clients.iter_mut() {
            if let LinkState::Dropped { since } = client.state {
                if now.duration_since(since) >= settings.reconnect_delay {
                    client.state = LinkState::Online;
                    client.deliver(TransportEvent::Connected);
                }
            }

            loop {
                let frame = match client.frames.next().now_or_never() {
                    Some(Some(frame)) => frame,
                    Some(None) => {
                        client.state = LinkState::Closed;
                        break;
                    }
                    None => break,
                };

                if client.state != LinkState::Online {
                    // Frames sent over a dead link are lost
                    continue;
                }

                match frame {
                    OutboundFrame::Subscribe { topic } => {
                        client.subscriptions.insert(topic);
                    }
                    OutboundFrame::Publish { destination, body } => {
                        if destination != routes.destination {
                            log::warn!("broker: no route for {destination}");
                            continue;
                        }
                        match relay(&body) {
                            Some(broadcast) => broadcasts.push(broadcast),
                            None => log::warn!("broker: discarding unroutable publish {body}"),
                        }
                    }
                    OutboundFrame::Heartbeat => log::trace!("broker: heartbeat"),
                    OutboundFrame::Close => client.state = LinkState::Closed,
                }
            }
        }

        clients.retain(|c| c.state != LinkState::Closed);

        let mut delivered = 0;
        for body in broadcasts {
            delivered += deliver_to_subscribers(clients, &routes.topic, &body);
        }
        delivered
    }

    /// Push a raw text frame to every subscriber, bypassing the relay
    pub fn broadcast_raw(&self, body: &str) -> usize {
        let mut state = self.inner.borrow_mut();
        let BrokerState { routes, clients, .. } = &mut *state;
        deliver_to_subscribers(clients, &routes.topic, body)
    }

    /// Simulate a network drop on every live link
    pub fn drop_connections(&self) {
        let now = Instant::now();
        for client in self.inner.borrow_mut().clients.iter_mut() {
            if client.state == LinkState::Online {
                client.subscriptions.clear();
                client.state = LinkState::Dropped { since: now };
                client.deliver(TransportEvent::Disconnected);
            }
        }
    }

    /// Report a broker-side error to every live link
    pub fn fail(&self, message: &str) {
        for client in self.inner.borrow_mut().clients.iter_mut() {
            if client.state == LinkState::Online {
                client.deliver(TransportEvent::BrokerError(message.to_string()));
            }
        }
    }

    /// Open links, online or waiting to reconnect
    pub fn client_count(&self) -> usize {
        self.inner.borrow().clients.len()
    }

    /// Live links subscribed to the pixel topic
    pub fn subscriber_count(&self) -> usize {
        let state = self.inner.borrow();
        state
            .clients
            .iter()
            .filter(|c| c.state == LinkState::Online && c.subscriptions.contains(&state.routes.topic))
            .count()
    }
}

/// Turn a published `send` envelope into the `get` broadcast
fn relay(body: &str) -> Option<String> {
    let envelope = Envelope::parse(body).ok()?;
    if envelope.kind != KIND_SEND {
        return None;
    }
    let pixel = envelope.pixel().ok()?;
    Some(Envelope::get(pixel).to_json())
}

fn deliver_to_subscribers(clients: &mut [Client], topic: &str, body: &str) -> usize {
    let mut delivered = 0;
    for client in clients.iter_mut() {
        if client.state == LinkState::Online && client.subscriptions.contains(topic) {
            client.deliver(TransportEvent::Message {
                topic: topic.to_string(),
                body: body.to_string(),
            });
            delivered += 1;
        }
    }
    delivered
}

impl Transport for LocalBroker {
    fn open(&mut self, credential: &str) -> Result<TransportLink> {
        if credential.trim().is_empty() {
            return Err(CanvasError::NotAuthenticated);
        }

        let (outbound, frames) = mpsc::unbounded();
        let (events, inbound) = mpsc::unbounded();
        let mut client = Client {
            frames,
            events,
            subscriptions: HashSet::new(),
            state: LinkState::Online,
        };
        client.deliver(TransportEvent::Connected);
        self.inner.borrow_mut().clients.push(client);

        Ok(TransportLink { outbound, inbound })
    }

    fn service(&mut self) {
        self.pump();
    }
}
