use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Payload of a single data frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamEvent {
    Content(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Event(StreamEvent),
    Done,
}

impl Frame {
    pub fn content<S: Into<String>>(delta: S) -> Self {
        Frame::Event(StreamEvent::Content(delta.into()))
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Frame::Event(StreamEvent::Error(message.into()))
    }

    /// Render the frame as it goes on the wire
    pub fn encode(&self) -> String {
        match self {
            Frame::Done => format!("{}{}\n\n", DATA_PREFIX, DONE_SENTINEL),
            Frame::Event(event) => {
                let json = serde_json::to_string(event)
                    .unwrap_or_else(|_| r#"{"error":"failed to encode frame"}"#.to_string());
                format!("{}{}\n\n", DATA_PREFIX, json)
            }
        }
    }
}

/// How a single complete line of the stream was understood
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Blank lines, comments, or anything without the data prefix
    Ignored,
    Done,
    Event(StreamEvent),
    Malformed(String),
}

// Decoded leniently: browsers destructure `{content, error}` so both keys may be present
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

pub fn parse_line(line: &str) -> ParsedLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return ParsedLine::Ignored;
    };
    if payload == DONE_SENTINEL {
        return ParsedLine::Done;
    }

    let raw: RawEvent = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        Err(e) => return ParsedLine::Malformed(e.to_string()),
    };

    let error = match raw.error {
        Some(Value::Null) | None => None,
        Some(Value::String(message)) => Some(message),
        Some(other) => Some(other.to_string()),
    };
    match (error, raw.content) {
        (Some(message), _) if !message.is_empty() => ParsedLine::Event(StreamEvent::Error(message)),
        (_, Some(delta)) if !delta.is_empty() => ParsedLine::Event(StreamEvent::Content(delta)),
        _ => ParsedLine::Ignored,
    }
}
