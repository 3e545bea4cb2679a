//! Fixed-size records exchanged with subscribers over TCP.
//!
//! ```text
//! identity   : id[10]                                              10 bytes
//! command    : tag u8 | topic[51] | store_and_forward u8           53 bytes
//! message    : type[11] | topic[51] | content[1501] | ip[16]
//!              | pad u8 | port u16                                1582 bytes
//! ```
//!
//! The pad byte in the message record aligns `port` the way the subscriber
//! peers' native struct does.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{CodecError, field_bytes, field_str, put_field};
use crate::broker::message::{CanonicalMessage, ContentType};
use crate::transport::message::SubscriberCommand;

pub const IDENTITY_LEN: usize = 10;

pub const COMMAND_TOPIC_LEN: usize = 51;
pub const COMMAND_LEN: usize = 1 + COMMAND_TOPIC_LEN + 1;

const SUBSCRIBE: u8 = 0;
const UNSUBSCRIBE: u8 = 1;
const EXIT: u8 = 2;

pub const TYPE_NAME_LEN: usize = 11;
pub const MESSAGE_TOPIC_LEN: usize = 51;
pub const MESSAGE_CONTENT_LEN: usize = 1501;
pub const ADDRESS_LEN: usize = 16;
pub const MESSAGE_LEN: usize =
    TYPE_NAME_LEN + MESSAGE_TOPIC_LEN + MESSAGE_CONTENT_LEN + ADDRESS_LEN + 1 + 2;

/// Parses the identity a subscriber sends right after connecting.
pub fn decode_identity(bytes: &[u8]) -> Result<String, CodecError> {
    let id = field_str(&bytes[..bytes.len().min(IDENTITY_LEN)], "identity")?;
    if id.is_empty() {
        return Err(CodecError::EmptyIdentity);
    }
    Ok(id)
}

pub fn encode_identity(id: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(IDENTITY_LEN);
    let raw = id.as_bytes();
    let len = raw.len().min(IDENTITY_LEN);
    buf.put_slice(&raw[..len]);
    buf.put_bytes(0, IDENTITY_LEN - len);
    buf.freeze()
}

pub fn decode_command(bytes: &[u8]) -> Result<SubscriberCommand, CodecError> {
    if bytes.len() != COMMAND_LEN {
        return Err(CodecError::BadRecordLength {
            len: bytes.len(),
            expected: COMMAND_LEN,
        });
    }
    let mut buf = bytes;
    let tag = buf.get_u8();
    let topic = field_str(&buf[..COMMAND_TOPIC_LEN], "topic")?;
    buf.advance(COMMAND_TOPIC_LEN);
    let store_and_forward = buf.get_u8() == 1;

    match tag {
        SUBSCRIBE => Ok(SubscriberCommand::Subscribe {
            topic,
            store_and_forward,
        }),
        UNSUBSCRIBE => Ok(SubscriberCommand::Unsubscribe { topic }),
        EXIT => Ok(SubscriberCommand::Exit),
        other => Err(CodecError::UnknownCommand(other)),
    }
}

pub fn encode_command(command: &SubscriberCommand) -> Bytes {
    let mut buf = BytesMut::with_capacity(COMMAND_LEN);
    let (tag, topic, store_and_forward) = match command {
        SubscriberCommand::Subscribe {
            topic,
            store_and_forward,
        } => (SUBSCRIBE, topic.as_str(), *store_and_forward),
        SubscriberCommand::Unsubscribe { topic } => (UNSUBSCRIBE, topic.as_str(), false),
        SubscriberCommand::Exit => (EXIT, "", false),
    };
    buf.put_u8(tag);
    put_field(&mut buf, topic.as_bytes(), COMMAND_TOPIC_LEN);
    buf.put_u8(u8::from(store_and_forward));
    buf.freeze()
}

/// Serializes a message into the record subscribers read.
pub fn encode_message(msg: &CanonicalMessage) -> Bytes {
    let mut buf = BytesMut::with_capacity(MESSAGE_LEN);
    put_field(&mut buf, msg.content_type.as_str().as_bytes(), TYPE_NAME_LEN);
    put_field(&mut buf, msg.topic.as_bytes(), MESSAGE_TOPIC_LEN);
    put_field(&mut buf, &msg.content, MESSAGE_CONTENT_LEN);
    put_field(&mut buf, msg.origin.ip().to_string().as_bytes(), ADDRESS_LEN);
    buf.put_u8(0);
    buf.put_u16(msg.origin.port());
    buf.freeze()
}

pub fn decode_message(bytes: &[u8]) -> Result<CanonicalMessage, CodecError> {
    if bytes.len() != MESSAGE_LEN {
        return Err(CodecError::BadRecordLength {
            len: bytes.len(),
            expected: MESSAGE_LEN,
        });
    }
    let mut buf = bytes;
    let type_name = field_str(take(&mut buf, TYPE_NAME_LEN), "type name")?;
    let topic = field_str(take(&mut buf, MESSAGE_TOPIC_LEN), "topic")?;
    let content = Bytes::copy_from_slice(field_bytes(take(&mut buf, MESSAGE_CONTENT_LEN)));
    let address = field_str(take(&mut buf, ADDRESS_LEN), "address")?;
    buf.advance(1);
    let port = buf.get_u16();

    let content_type = ContentType::from_name(&type_name).ok_or(CodecError::UnknownTypeName(type_name))?;
    let ip = address
        .parse::<IpAddr>()
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    Ok(CanonicalMessage {
        content_type,
        topic,
        content,
        origin: SocketAddr::new(ip, port),
    })
}

fn take<'a>(buf: &mut &'a [u8], width: usize) -> &'a [u8] {
    let (field, rest) = buf.split_at(width);
    *buf = rest;
    field
}
