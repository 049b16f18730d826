// ABOUTME: Minimal STOMP 1.2 frame codec for the progress push channel
// ABOUTME: Encodes client frames and decodes server frames carried in WebSocket text messages

use std::time::Duration;

use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// First value wins, as STOMP requires for repeated headers.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn connect(host: &str, heartbeat: Duration) -> Self {
        let ms = heartbeat.as_millis();
        Frame::new("CONNECT")
            .header("accept-version", "1.2,1.1")
            .header("host", host)
            .header("heart-beat", format!("{},{}", ms, ms))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new("SUBSCRIBE")
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn unsubscribe(id: &str) -> Self {
        Frame::new("UNSUBSCRIBE").header("id", id)
    }

    pub fn disconnect() -> Self {
        Frame::new("DISCONNECT")
    }

    pub fn encode(&self) -> String {
        let escape = self.command != "CONNECT" && self.command != "CONNECTED";
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
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

    fn parse_one(raw: &str) -> Result<Option<Frame>> {
        let raw = raw.trim_start_matches(['\r', '\n']);
        if raw.is_empty() {
            // Heart-beat
            return Ok(None);
        }

        let (head, body) = match raw.find("\n\n") {
            Some(idx) => (&raw[..idx], &raw[idx + 2..]),
            None => match raw.find("\r\n\r\n") {
                Some(idx) => (&raw[..idx], &raw[idx + 4..]),
                None => (raw, ""),
            },
        };

        let mut lines = head.lines();
        let command = lines
            .next()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ConsoleError::push("STOMP frame without command"))?
            .to_string();
        let unescape = command != "CONNECTED";

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ConsoleError::push(format!("malformed STOMP header '{}'", line)))?;
            if unescape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        Ok(Some(Frame {
            command,
            headers,
            body: body.to_string(),
        }))
    }
}

/// Decode every frame in a WebSocket text message. Bare EOLs are heart-beats and yield nothing.
pub fn parse_frames(message: &str) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    for chunk in message.split('\0') {
        if let Some(frame) = Frame::parse_one(chunk)? {
            frames.push(frame);
        }
    }
    Ok(frames)
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_header(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(ConsoleError::push(format!(
                    "invalid STOMP header escape '\\{}'",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}

/// Heart-beat periods agreed between our CONNECT and the server's CONNECTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub outgoing: Option<Duration>,
    pub incoming: Option<Duration>,
}

impl Heartbeat {
    pub fn negotiate(client: Duration, server_header: Option<&str>) -> Self {
        let client_ms = client.as_millis() as u64;
        let (sx, sy) = server_header
            .and_then(|h| h.split_once(','))
            .and_then(|(x, y)| Some((x.trim().parse::<u64>().ok()?, y.trim().parse::<u64>().ok()?)))
            .unwrap_or((0, 0));

        let pick = |ours: u64, theirs: u64| {
            (ours > 0 && theirs > 0).then(|| Duration::from_millis(ours.max(theirs)))
        };

        Self {
            outgoing: pick(client_ms, sy),
            incoming: pick(client_ms, sx),
        }
    }
}
