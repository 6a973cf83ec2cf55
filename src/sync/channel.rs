use std::time::Instant;

use futures::{FutureExt, StreamExt};

use super::envelope::{decode_update, encode_send};
use super::transport::{OutboundFrame, Transport, TransportEvent, TransportLink, TransportSettings};
use crate::board::{Pixel, PixelBuffer};
use crate::core::timer::Interval;
use crate::error::{CanvasError, Result};
use crate::status::StatusLog;

/// Anything a placement can be published through
pub trait Publisher {
    fn publish(&mut self, pixel: Pixel) -> Result<()>;
}

/// Where placements go and where broadcasts come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRoutes {
    pub destination: String,
    pub topic: String,
}

impl Default for ChannelRoutes {
    fn default() -> Self {
        Self {
            destination: "/app/pixel".to_string(),
            topic: "/topic/pixels".to_string(),
        }
    }
}

/// Result of draining the inbound queue once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Broadcast pixels written to the buffer
    pub applied: usize,
    /// Malformed or invalid broadcasts discarded
    pub dropped: usize,
}

struct Session {
    link: TransportLink,
    connected: bool,
    subscribed: bool,
}

impl Session {
    fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.link
            .outbound
            .unbounded_send(frame)
            .map_err(|e| CanvasError::Transport(e.to_string()))
    }
}

/// Real-time pixel stream over a `Transport`
///
/// At most one session is live. Broadcasts are applied to the buffer as
/// they are drained by `poll`, including echoes of our own placements.
pub struct SyncChannel {
    transport: Box<dyn Transport>,
    routes: ChannelRoutes,
    heartbeat: Interval,
    session: Option<Session>,
}

impl SyncChannel {
    pub fn new(transport: Box<dyn Transport>, routes: ChannelRoutes, settings: TransportSettings) -> Self {
        Self {
            transport,
            routes,
            heartbeat: Interval::new(settings.heartbeat),
            session: None,
        }
    }

    pub fn routes(&self) -> &ChannelRoutes {
        &self.routes
    }

    /// Open a session, replacing any previous one
    pub fn connect(&mut self, credential: &str) -> Result<()> {
        self.disconnect();
        let link = self.transport.open(credential)?;
        self.session = Some(Session {
            link,
            connected: false,
            subscribed: false,
        });
        log::debug!("sync channel session opened");
        Ok(())
    }

    /// A session exists and its link is currently up
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.connected)
    }

    /// A session exists, connected or waiting on the transport
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Drain everything the transport has delivered so far. Never blocks.
    pub fn poll(&mut self, buffer: &mut PixelBuffer, status: &mut StatusLog) -> PollSummary {
        let mut summary = PollSummary::default();
        self.transport.service();

        loop {
            let Some(session) = self.session.as_mut() else {
                break;
            };

            let event = match session.link.inbound.next().now_or_never() {
                Some(Some(event)) => event,
                Some(None) => {
                    log::warn!("transport closed the session");
                    self.end_session();
                    break;
                }
                None => break,
            };

            match event {
                TransportEvent::Connected => {
                    session.connected = true;
                    if !session.subscribed {
                        let topic = self.routes.topic.clone();
                        match session.send(OutboundFrame::Subscribe { topic }) {
                            Ok(()) => session.subscribed = true,
                            Err(e) => log::warn!("subscribe failed: {e}"),
                        }
                    }
                    self.heartbeat.start(Instant::now());
                    log::info!("connected to {}", self.routes.topic);
                    status.success("Connected to canvas.");
                }
                TransportEvent::Disconnected => {
                    session.connected = false;
                    session.subscribed = false;
                    self.heartbeat.stop();
                    status.warning("Live updates interrupted. Reconnecting...");
                }
                TransportEvent::Message { topic, body } => {
                    if topic != self.routes.topic {
                        log::trace!("ignoring message on {topic}");
                        continue;
                    }
                    match decode_update(&body) {
                        Ok(Some(pixel)) if buffer.apply(pixel, true) => summary.applied += 1,
                        Ok(Some(pixel)) => {
                            log::debug!("dropping out-of-range broadcast {pixel:?}");
                            summary.dropped += 1;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            log::warn!("{e}");
                            summary.dropped += 1;
                        }
                    }
                }
                TransportEvent::BrokerError(message) => {
                    status.error(format!("Live updates failed: {message}"));
                    self.disconnect();
                    break;
                }
            }
        }

        self.beat();
        summary
    }

    fn beat(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.connected && self.heartbeat.poll(Instant::now()) {
            if let Err(e) = session.send(OutboundFrame::Heartbeat) {
                log::debug!("heartbeat not sent: {e}");
            }
        }
    }

    /// Tear the session down. Returns false when there was none.
    pub fn disconnect(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        // The link may already be gone on the transport side
        let _ = session.send(OutboundFrame::Close);
        session.link.outbound.close_channel();
        self.heartbeat.stop();
        log::info!("sync channel disconnected");
        true
    }

    fn end_session(&mut self) {
        self.session = None;
        self.heartbeat.stop();
    }
}

impl Publisher for SyncChannel {
    /// Fails fast when not connected; nothing is queued
    fn publish(&mut self, pixel: Pixel) -> Result<()> {
        let session = match self.session.as_ref() {
            Some(session) if session.connected => session,
            _ => return Err(CanvasError::Transport("not connected".into())),
        };

        session.send(OutboundFrame::Publish {
            destination: self.routes.destination.clone(),
            body: encode_send(pixel),
        })
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::sync::broker::LocalBroker;
    use std::time::Duration;

    fn settings() -> TransportSettings {
        TransportSettings {
            reconnect_delay: Duration::ZERO,
            heartbeat: Duration::from_secs(10),
        }
    }

    fn channel(broker: &LocalBroker) -> SyncChannel {
        SyncChannel::new(Box::new(broker.clone()), ChannelRoutes::default(), settings())
    }

    fn fixtures() -> (PixelBuffer, StatusLog) {
        (PixelBuffer::new(10, 10, Palette::default()), StatusLog::new())
    }

    #[test]
    fn publish_fails_fast_when_disconnected() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);

        let err = channel.publish(Pixel::new(1, 1, 1)).unwrap_err();
        assert!(matches!(err, CanvasError::Transport(_)));
    }

    #[test]
    fn publish_fails_before_connected_event_is_drained() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);
        channel.connect("token").unwrap();

        assert!(channel.has_session());
        assert!(!channel.is_connected());
        assert!(channel.publish(Pixel::new(1, 1, 1)).is_err());
    }

    #[test]
    fn subscribes_once_per_session() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);
        let (mut buffer, mut status) = fixtures();

        channel.connect("token").unwrap();
        channel.poll(&mut buffer, &mut status);
        channel.poll(&mut buffer, &mut status);
        broker.pump();

        assert!(channel.is_connected());
        assert_eq!(broker.subscriber_count(), 1);
    }

    #[test]
    fn connect_is_reported_in_status() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);
        let (mut buffer, mut status) = fixtures();

        channel.connect("token").unwrap();
        assert!(status.is_empty());
        channel.poll(&mut buffer, &mut status);

        let latest = status.latest().unwrap();
        assert_eq!(latest.level, crate::status::StatusLevel::Success);
        assert_eq!(latest.text, "Connected to canvas.");
    }

    #[test]
    fn reconnect_tears_down_previous_session() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);
        let (mut buffer, mut status) = fixtures();

        channel.connect("token").unwrap();
        channel.poll(&mut buffer, &mut status);
        channel.connect("token").unwrap();
        channel.poll(&mut buffer, &mut status);
        broker.pump();

        assert_eq!(broker.client_count(), 1);
        assert_eq!(broker.subscriber_count(), 1);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);

        assert!(!channel.disconnect());
        channel.connect("token").unwrap();
        assert!(channel.disconnect());
        assert!(!channel.disconnect());
        assert!(!channel.is_connected());
    }

    #[test]
    fn broker_error_disconnects_and_reports() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);
        let (mut buffer, mut status) = fixtures();

        channel.connect("token").unwrap();
        channel.poll(&mut buffer, &mut status);
        broker.fail("access denied");
        channel.poll(&mut buffer, &mut status);

        assert!(!channel.has_session());
        let latest = status.latest().unwrap();
        assert_eq!(latest.level, crate::status::StatusLevel::Error);
        assert!(latest.text.contains("access denied"));
    }

    #[test]
    fn malformed_broadcasts_are_dropped() {
        let broker = LocalBroker::new(ChannelRoutes::default(), settings());
        let mut channel = channel(&broker);
        let (mut buffer, mut status) = fixtures();

        channel.connect("token").unwrap();
        channel.poll(&mut buffer, &mut status);
        broker.pump();

        broker.broadcast_raw("{broken");
        broker.broadcast_raw(r#"{"type":"get","content":{"x":50,"y":0,"c":1}}"#);
        broker.broadcast_raw(r#"{"type":"get","content":{"x":2,"y":3,"c":4}}"#);
        let summary = channel.poll(&mut buffer, &mut status);

        assert_eq!(summary, PollSummary { applied: 1, dropped: 2 });
        assert_eq!(buffer.color_at(2, 3), Some(4));
        assert!(channel.is_connected());
    }
}
