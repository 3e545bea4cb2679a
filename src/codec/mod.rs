//! Binary formats spoken at the two edges of the relay.
//!
//! - [`publish`] turns a publisher datagram into a [`CanonicalMessage`].
//! - [`wire`] lays out the fixed-size records exchanged with subscribers.
//!
//! All multi-byte integers are big-endian (network order). Text fields are
//! fixed-width, NUL padded, and may be unterminated when full.
//!
//! [`CanonicalMessage`]: crate::broker::CanonicalMessage

pub mod publish;
pub mod wire;

use thiserror::Error;

pub use publish::{RawPublishPacket, decode};

/// Width of the topic field in a publisher datagram.
pub const TOPIC_LEN: usize = 50;
/// Largest content region a publisher datagram may carry.
pub const CONTENT_LEN: usize = 1500;
/// Largest publisher datagram: topic, type tag, content.
pub const DATAGRAM_LEN: usize = TOPIC_LEN + 1 + CONTENT_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("datagram of {len} bytes is shorter than the {needed}-byte header")]
    TruncatedHeader { len: usize, needed: usize },

    #[error("{content_type} payload needs {needed} bytes, got {len}")]
    TruncatedContent {
        content_type: &'static str,
        needed: usize,
        len: usize,
    },

    #[error("unknown content type tag {0}")]
    UnknownContentType(u8),

    #[error("unknown content type name {0:?}")]
    UnknownTypeName(String),

    #[error("unknown subscriber command tag {0}")]
    UnknownCommand(u8),

    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("empty client identity")]
    EmptyIdentity,

    #[error("record of {len} bytes, expected {expected}")]
    BadRecordLength { len: usize, expected: usize },
}

/// The bytes of a fixed-width field up to its first NUL. Without a
/// terminator the whole field is used.
pub(crate) fn field_bytes(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Like [`field_bytes`], but the value must be UTF-8. Topics and identities
/// are map keys and are compared byte for byte, so no lossy conversion.
pub(crate) fn field_str(field: &[u8], name: &'static str) -> Result<String, CodecError> {
    String::from_utf8(field_bytes(field).to_vec()).map_err(|_| CodecError::InvalidUtf8 { field: name })
}

/// Writes `raw` into a fixed-width field, truncated so at least one NUL
/// terminator remains, and zero-pads the rest.
pub(crate) fn put_field(buf: &mut bytes::BytesMut, raw: &[u8], width: usize) {
    use bytes::BufMut;

    let len = raw.len().min(width.saturating_sub(1));
    buf.put_slice(&raw[..len]);
    buf.put_bytes(0, width - len);
}

#[cfg(test)]
mod tests;
