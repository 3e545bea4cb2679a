use std::net::SocketAddr;

use bytes::{Buf, Bytes};

use super::{CONTENT_LEN, CodecError, TOPIC_LEN, field_bytes, field_str};
use crate::broker::message::{CanonicalMessage, ContentType};

/// Read-only view over a publisher datagram.
///
/// Layout: `topic[50] | type u8 | content[..1500]`. Datagrams may stop
/// right after the bytes their content type uses.
#[derive(Debug, Clone, Copy)]
pub struct RawPublishPacket<'a> {
    bytes: &'a [u8],
}

impl<'a> RawPublishPacket<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, CodecError> {
        if bytes.len() < TOPIC_LEN + 1 {
            return Err(CodecError::TruncatedHeader {
                len: bytes.len(),
                needed: TOPIC_LEN + 1,
            });
        }
        Ok(Self { bytes })
    }

    pub fn topic(&self) -> Result<String, CodecError> {
        field_str(&self.bytes[..TOPIC_LEN], "topic")
    }

    pub fn type_tag(&self) -> u8 {
        self.bytes[TOPIC_LEN]
    }

    pub fn content(&self) -> &'a [u8] {
        let content = &self.bytes[TOPIC_LEN + 1..];
        &content[..content.len().min(CONTENT_LEN)]
    }
}

/// Decodes a publisher datagram received from `origin`.
pub fn decode(bytes: &[u8], origin: SocketAddr) -> Result<CanonicalMessage, CodecError> {
    let packet = RawPublishPacket::new(bytes)?;
    let content_type =
        ContentType::from_tag(packet.type_tag()).ok_or(CodecError::UnknownContentType(packet.type_tag()))?;
    let content = render(content_type, packet.content())?;

    Ok(CanonicalMessage {
        content_type,
        topic: packet.topic()?,
        content,
        origin,
    })
}

/// Numeric values are rendered as decimal text; STRING content is copied
/// byte for byte.
fn render(content_type: ContentType, mut content: &[u8]) -> Result<Bytes, CodecError> {
    match content_type {
        ContentType::Int => {
            require(content_type, content, 5)?;
            let negative = content.get_u8() == 1;
            let magnitude = i64::from(content.get_u32());
            let value = if negative { -magnitude } else { magnitude };
            Ok(Bytes::from(value.to_string()))
        }
        ContentType::ShortReal => {
            require(content_type, content, 2)?;
            let raw = content.get_u16();
            Ok(Bytes::from(format!("{}.{:02}", raw / 100, raw % 100)))
        }
        ContentType::Float => {
            require(content_type, content, 6)?;
            let negative = content.get_u8() == 1;
            let magnitude = f64::from(content.get_u32());
            let exponent = content.get_u8();
            let mut value = magnitude / 10f64.powi(i32::from(exponent));
            if negative {
                value = -value;
            }
            Ok(Bytes::from(format!("{value:.6}")))
        }
        ContentType::String => Ok(Bytes::copy_from_slice(field_bytes(content))),
    }
}

fn require(content_type: ContentType, content: &[u8], needed: usize) -> Result<(), CodecError> {
    if content.len() < needed {
        return Err(CodecError::TruncatedContent {
            content_type: content_type.as_str(),
            needed,
            len: content.len(),
        });
    }
    Ok(())
}
