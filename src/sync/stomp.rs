use crate::error::{CanvasError, Result};

/// What a bare end-of-line means on a STOMP link
pub const HEARTBEAT: &str = "\n";

/// One STOMP 1.2 frame as carried in a WebSocket text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// First value of a header; repeated headers keep the first occurrence
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Session handshake. `heartbeat_ms` is offered in both directions.
    pub fn connect(host: &str, credential: &str, heartbeat_ms: u64) -> Self {
        Self::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", host)
            .header("heart-beat", &format!("{heartbeat_ms},{heartbeat_ms}"))
            .header("Authorization", credential)
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new("SUBSCRIBE").header("id", id).header("destination", destination)
    }

    pub fn send(destination: &str, body: &str) -> Self {
        Self::new("SEND")
            .header("destination", destination)
            .header("content-type", "application/json")
            .header("content-length", &body.len().to_string())
            .body(body)
    }

    pub fn disconnect() -> Self {
        Self::new("DISCONNECT")
    }

    /// Wire text, NUL terminated
    pub fn encode(&self) -> String {
        // CONNECT and CONNECTED headers are never escaped
        let escaped = !matches!(self.command.as_str(), "CONNECT" | "CONNECTED");
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            if escaped {
                out.push_str(&escape(name));
                out.push(':');
                out.push_str(&escape(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame. Heartbeats (bare EOLs) parse to `None`.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let text = text.trim_start_matches(['\r', '\n']);
        if text.is_empty() {
            return Ok(None);
        }

        let (head, rest) = split_head(text)
            .ok_or_else(|| CanvasError::MalformedMessage("STOMP frame without header terminator".into()))?;
        let mut lines = head.lines().map(|line| line.strip_suffix('\r').unwrap_or(line));
        let command = lines
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CanvasError::MalformedMessage("STOMP frame without command".into()))?;
        let escaped = !matches!(command, "CONNECT" | "CONNECTED");

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| CanvasError::MalformedMessage(format!("bad STOMP header {line:?}")))?;
            if escaped {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let mut frame = Self {
            command: command.to_string(),
            headers,
            body: String::new(),
        };
        let length = frame.get("content-length").and_then(|l| l.parse::<usize>().ok());
        frame.body = match length {
            Some(n) if rest.len() >= n && rest.is_char_boundary(n) => rest[..n].to_string(),
            _ => rest.split('\0').next().unwrap_or_default().to_string(),
        };
        Ok(Some(frame))
    }
}

fn split_head(text: &str) -> Option<(&str, &str)> {
    let lf = text.find("\n\n").map(|i| (i, 2));
    let crlf = text.find("\r\n\r\n").map(|i| (i, 4));
    let (at, skip) = match (lf, crlf) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    Some((&text[..at], &text[at + skip..]))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(CanvasError::MalformedMessage(format!("bad STOMP escape \\{other:?}")));
            }
        }
    }
    Ok(out)
}
