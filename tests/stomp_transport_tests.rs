use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pixel_canvas::board::{Pixel, PixelBuffer};
use pixel_canvas::palette::Palette;
use pixel_canvas::status::{StatusLevel, StatusLog};
use pixel_canvas::sync::stomp::StompFrame;
use pixel_canvas::sync::{ChannelRoutes, Envelope, Publisher, StompTransport, SyncChannel, TransportSettings};
use tungstenite::Message;

#[cfg(test)]
mod stomp_transport_tests {
    use super::*;

    fn settings() -> TransportSettings {
        TransportSettings {
            reconnect_delay: Duration::from_millis(50),
            heartbeat: Duration::from_secs(10),
        }
    }

    /// Single-client STOMP broker. Echoes every SEND on `/app/pixel` as a
    /// `get` broadcast on `/topic/pixels`. Yields the commands it received.
    fn serve(reject: Option<&'static str>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let Ok(mut ws) = tungstenite::accept(stream) else {
                panic!("websocket handshake failed");
            };
            let mut commands = Vec::new();

            loop {
                let text = match ws.read() {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => continue,
                };
                let Some(frame) = StompFrame::parse(&text).unwrap() else {
                    continue;
                };
                commands.push(frame.command.clone());

                match frame.command.as_str() {
                    "CONNECT" => {
                        assert_eq!(frame.get("Authorization"), Some("bearer-token"));
                        assert_eq!(frame.get("accept-version"), Some("1.2"));
                        let reply = match reject {
                            Some(message) => StompFrame::new("ERROR").header("message", message),
                            None => StompFrame::new("CONNECTED").header("version", "1.2"),
                        };
                        ws.send(Message::Text(reply.encode())).unwrap();
                        if reject.is_some() {
                            break;
                        }
                    }
                    "SEND" => {
                        assert_eq!(frame.get("destination"), Some("/app/pixel"));
                        let pixel = Envelope::parse(&frame.body).unwrap().pixel().unwrap();
                        let broadcast = StompFrame::new("MESSAGE")
                            .header("destination", "/topic/pixels")
                            .header("subscription", "sub-1")
                            .header("message-id", "1")
                            .body(&Envelope::get(pixel).to_json());
                        ws.send(Message::Text(broadcast.encode())).unwrap();
                    }
                    "DISCONNECT" => break,
                    _ => {}
                }
            }
            let _ = ws.close(None);
            commands
        });
        (url, handle)
    }

    fn poll_until(
        channel: &mut SyncChannel,
        buffer: &mut PixelBuffer,
        status: &mut StatusLog,
        done: impl Fn(&SyncChannel, &PixelBuffer) -> bool,
    ) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(channel, buffer) {
            assert!(Instant::now() < deadline, "timed out waiting on the broker");
            channel.poll(buffer, status);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_placement_round_trips_through_broker() {
        let (url, server) = serve(None);
        let mut buffer = PixelBuffer::new(16, 16, Palette::default());
        let mut status = StatusLog::new();
        let mut channel =
            SyncChannel::new(Box::new(StompTransport::new(url, settings())), ChannelRoutes::default(), settings());

        channel.connect("bearer-token").unwrap();
        poll_until(&mut channel, &mut buffer, &mut status, |c, _| c.is_connected());
        assert_eq!(status.latest().unwrap().text, "Connected to canvas.");

        channel.publish(Pixel::new(3, 4, 5)).unwrap();
        poll_until(&mut channel, &mut buffer, &mut status, |_, b| b.color_at(3, 4) == Some(5));

        assert!(channel.disconnect());
        assert_eq!(server.join().unwrap(), ["CONNECT", "SUBSCRIBE", "SEND", "DISCONNECT"]);
    }

    #[test]
    fn test_rejected_credential_ends_session() {
        let (url, server) = serve(Some("Invalid token"));
        let mut buffer = PixelBuffer::new(16, 16, Palette::default());
        let mut status = StatusLog::new();
        let mut channel =
            SyncChannel::new(Box::new(StompTransport::new(url, settings())), ChannelRoutes::default(), settings());

        channel.connect("bearer-token").unwrap();
        poll_until(&mut channel, &mut buffer, &mut status, |c, _| !c.has_session());

        let latest = status.latest().unwrap();
        assert_eq!(latest.level, StatusLevel::Error);
        assert_eq!(latest.text, "Live updates failed: Invalid token");
        assert_eq!(server.join().unwrap(), ["CONNECT"]);
    }

    #[test]
    fn test_publish_before_connected_fails_fast() {
        let (url, server) = serve(None);
        let mut channel =
            SyncChannel::new(Box::new(StompTransport::new(url, settings())), ChannelRoutes::default(), settings());

        channel.connect("bearer-token").unwrap();
        assert!(channel.publish(Pixel::new(0, 0, 0)).is_err());

        let mut buffer = PixelBuffer::new(4, 4, Palette::default());
        let mut status = StatusLog::new();
        poll_until(&mut channel, &mut buffer, &mut status, |c, _| c.is_connected());
        channel.disconnect();
        server.join().unwrap();
    }
}
