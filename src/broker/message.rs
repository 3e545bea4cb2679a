use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;

/// The kind of value a publisher sent, as named on the subscriber wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Int,
    ShortReal,
    Float,
    String,
}

impl ContentType {
    /// Maps the publisher's one-byte type tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ContentType::Int),
            1 => Some(ContentType::ShortReal),
            2 => Some(ContentType::Float),
            3 => Some(ContentType::String),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            ContentType::Int => 0,
            ContentType::ShortReal => 1,
            ContentType::Float => 2,
            ContentType::String => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Int => "INT",
            ContentType::ShortReal => "SHORT_REAL",
            ContentType::Float => "FLOAT",
            ContentType::String => "STRING",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "INT" => Some(ContentType::Int),
            "SHORT_REAL" => Some(ContentType::ShortReal),
            "FLOAT" => Some(ContentType::Float),
            "STRING" => Some(ContentType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published value after decoding, ready to be handed to subscribers.
///
/// Built once by the codec from a publisher datagram and never modified
/// afterwards. The broker clones it per recipient.
///
/// # Fields
///
/// - `content_type` - Which of the four value kinds the publisher sent.
/// - `topic` - The topic the value was published on.
/// - `content` - Numbers rendered as text (`"-42"`, `"12.34"`, ...); STRING
///   payloads exactly as the publisher sent them, which need not be UTF-8.
/// - `origin` - Address and port of the publisher that sent the datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage {
    pub content_type: ContentType,
    pub topic: String,
    pub content: Bytes,
    pub origin: SocketAddr,
}

impl fmt::Display for CanonicalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {} - {} - {}",
            self.origin.ip(),
            self.origin.port(),
            self.topic,
            self.content_type,
            String::from_utf8_lossy(&self.content)
        )
    }
}
