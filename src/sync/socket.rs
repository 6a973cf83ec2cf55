use std::io;
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{FutureExt, StreamExt};
use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::stomp::{StompFrame, HEARTBEAT};
use super::transport::{OutboundFrame, Transport, TransportEvent, TransportLink, TransportSettings};
use crate::error::{CanvasError, Result};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// How long a blocked read waits before outbound frames get a turn
const POLL_INTERVAL: Duration = Duration::from_millis(20);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// STOMP over a WebSocket, one worker thread per session
///
/// The worker owns the socket. It connects, relays frames both ways and
/// after a drop waits `reconnect_delay` before dialing again. It stops
/// once the client sends `Close` or lets go of either end of the link.
#[derive(Debug, Clone)]
pub struct StompTransport {
    url: String,
    settings: TransportSettings,
}

impl StompTransport {
    /// `url` is a ws:// or wss:// endpoint speaking raw STOMP frames
    pub fn new(url: impl Into<String>, settings: TransportSettings) -> Self {
        Self {
            url: url.into(),
            settings,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for StompTransport {
    fn open(&mut self, credential: &str) -> Result<TransportLink> {
        if credential.trim().is_empty() {
            return Err(CanvasError::NotAuthenticated);
        }

        let (outbound, frames) = mpsc::unbounded();
        let (events, inbound) = mpsc::unbounded();
        let worker = SessionWorker {
            url: self.url.clone(),
            credential: credential.to_string(),
            settings: self.settings,
            frames,
            events,
            next_subscription: 0,
        };

        thread::Builder::new()
            .name("stomp-session".to_string())
            .spawn(move || worker.run())
            .map_err(|e| CanvasError::Transport(format!("could not start session worker: {e}")))?;
        log::debug!("stomp session worker started for {}", self.url);

        Ok(TransportLink { outbound, inbound })
    }
}

enum SessionEnd {
    /// Client is gone; do not reconnect
    Closed,
    /// Link failed; reconnect after the delay
    Lost(String),
}

enum Handshake {
    Ready(Socket),
    Rejected(String),
}

struct SessionWorker {
    url: String,
    credential: String,
    settings: TransportSettings,
    frames: UnboundedReceiver<OutboundFrame>,
    events: UnboundedSender<TransportEvent>,
    next_subscription: u64,
}

impl SessionWorker {
    fn run(mut self) {
        loop {
            match self.session() {
                SessionEnd::Closed => break,
                SessionEnd::Lost(reason) => log::warn!("stomp link to {} lost: {reason}", self.url),
            }
            if !self.wait_before_retry() {
                break;
            }
            log::info!("reconnecting to {}", self.url);
        }
        log::debug!("stomp session worker for {} finished", self.url);
    }

    /// One connection attempt, from dial to drop
    fn session(&mut self) -> SessionEnd {
        let mut socket = match self.handshake() {
            Ok(Handshake::Ready(socket)) => socket,
            Ok(Handshake::Rejected(message)) => {
                self.emit(TransportEvent::BrokerError(message.clone()));
                return SessionEnd::Lost(message);
            }
            Err(e) => return SessionEnd::Lost(format!("{e:#}")),
        };

        if !self.emit(TransportEvent::Connected) {
            let _ = socket.close(None);
            return SessionEnd::Closed;
        }
        log::info!("stomp session established with {}", self.url);

        let end = self.pump(&mut socket);
        if matches!(end, SessionEnd::Lost(_)) {
            self.emit(TransportEvent::Disconnected);
        }
        end
    }

    fn handshake(&self) -> anyhow::Result<Handshake> {
        let mut request = self.url.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert("Authorization", HeaderValue::from_str(&self.credential)?);
        let (mut socket, _) = tungstenite::connect(request).with_context(|| format!("connect to {}", self.url))?;

        set_read_timeout(&mut socket, HANDSHAKE_TIMEOUT)?;
        let heartbeat_ms = self.settings.heartbeat.as_millis() as u64;
        let connect = StompFrame::connect(&host_of(&self.url), &self.credential, heartbeat_ms);
        socket.send(Message::Text(connect.encode()))?;

        loop {
            let text = match socket.read()? {
                Message::Text(text) => text,
                Message::Close(_) => bail!("closed during handshake"),
                _ => continue,
            };
            let Some(frame) = StompFrame::parse(&text)? else {
                continue;
            };
            match frame.command.as_str() {
                "CONNECTED" => break,
                "ERROR" => return Ok(Handshake::Rejected(error_text(&frame))),
                other => log::debug!("ignoring {other} before CONNECTED"),
            }
        }

        set_read_timeout(&mut socket, POLL_INTERVAL)?;
        Ok(Handshake::Ready(socket))
    }

    fn pump(&mut self, socket: &mut Socket) -> SessionEnd {
        loop {
            loop {
                let frame = match self.frames.next().now_or_never() {
                    Some(Some(frame)) => frame,
                    Some(None) => return close(socket),
                    None => break,
                };
                let text = match frame {
                    OutboundFrame::Subscribe { topic } => {
                        self.next_subscription += 1;
                        StompFrame::subscribe(&format!("sub-{}", self.next_subscription), &topic).encode()
                    }
                    OutboundFrame::Publish { destination, body } => StompFrame::send(&destination, &body).encode(),
                    OutboundFrame::Heartbeat => HEARTBEAT.to_string(),
                    OutboundFrame::Close => return close(socket),
                };
                if let Err(e) = socket.send(Message::Text(text)) {
                    return SessionEnd::Lost(e.to_string());
                }
            }

            if self.events.is_closed() {
                return close(socket);
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    if let Some(end) = self.dispatch(&text) {
                        return end;
                    }
                }
                Ok(Message::Close(_)) => return SessionEnd::Lost("closed by server".to_string()),
                Ok(_) => {}
                Err(tungstenite::Error::Io(e)) if is_idle(&e) => {}
                Err(e) => return SessionEnd::Lost(e.to_string()),
            }
        }
    }

    fn dispatch(&mut self, text: &str) -> Option<SessionEnd> {
        let frame = match StompFrame::parse(text) {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("{e}");
                return None;
            }
        };

        let event = match frame.command.as_str() {
            "MESSAGE" => TransportEvent::Message {
                topic: frame.get("destination").unwrap_or_default().to_string(),
                body: frame.body,
            },
            "ERROR" => TransportEvent::BrokerError(error_text(&frame)),
            other => {
                log::trace!("ignoring {other} frame");
                return None;
            }
        };
        if self.emit(event) {
            None
        } else {
            Some(SessionEnd::Closed)
        }
    }

    /// Sleep out the reconnect delay. False once the client has left.
    fn wait_before_retry(&mut self) -> bool {
        let deadline = Instant::now() + self.settings.reconnect_delay;
        loop {
            // Frames sent while offline are lost
            loop {
                match self.frames.next().now_or_never() {
                    Some(Some(OutboundFrame::Close)) | Some(None) => return false,
                    Some(Some(_)) => {}
                    None => break,
                }
            }
            if self.events.is_closed() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(POLL_INTERVAL));
        }
    }

    fn emit(&self, event: TransportEvent) -> bool {
        self.events.unbounded_send(event).is_ok()
    }
}

fn close(socket: &mut Socket) -> SessionEnd {
    // Best effort: the peer may already be gone
    let _ = socket.send(Message::Text(StompFrame::disconnect().encode()));
    let _ = socket.close(None);
    let _ = socket.flush();
    SessionEnd::Closed
}

fn error_text(frame: &StompFrame) -> String {
    match frame.get("message") {
        Some(message) if !message.is_empty() => message.to_string(),
        _ if !frame.body.trim().is_empty() => frame.body.trim().to_string(),
        _ => "broker error".to_string(),
    }
}

fn is_idle(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn set_read_timeout(socket: &mut Socket, timeout: Duration) -> io::Result<()> {
    match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout)),
        MaybeTlsStream::Rustls(stream) => stream.sock.set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}

/// Authority part of a URL, for the STOMP `host` header
fn host_of(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?']).next().unwrap_or_default().to_string()
}
