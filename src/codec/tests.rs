use std::net::SocketAddr;

use bytes::Bytes;

use super::wire::{self, COMMAND_LEN, IDENTITY_LEN, MESSAGE_LEN};
use super::{CodecError, DATAGRAM_LEN, RawPublishPacket, TOPIC_LEN, decode};
use crate::broker::message::{CanonicalMessage, ContentType};
use crate::transport::message::SubscriberCommand;

fn origin() -> SocketAddr {
    "10.0.0.7:40123".parse().unwrap()
}

fn datagram(topic: &str, tag: u8, content: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; TOPIC_LEN];
    bytes[..topic.len()].copy_from_slice(topic.as_bytes());
    bytes.push(tag);
    bytes.extend_from_slice(content);
    bytes
}

#[test]
fn test_decode_negative_int() {
    let mut content = vec![1u8];
    content.extend_from_slice(&42u32.to_be_bytes());
    let msg = decode(&datagram("temp", 0, &content), origin()).unwrap();

    assert_eq!(msg.content_type, ContentType::Int);
    assert_eq!(msg.topic, "temp");
    assert_eq!(msg.content, "-42");
    assert_eq!(msg.origin, origin());
}

#[test]
fn test_decode_int_above_i32_range() {
    let mut content = vec![1u8];
    content.extend_from_slice(&u32::MAX.to_be_bytes());
    let msg = decode(&datagram("big", 0, &content), origin()).unwrap();
    assert_eq!(msg.content, "-4294967295");
}

#[test]
fn test_decode_short_real() {
    let msg = decode(&datagram("humidity", 1, &1234u16.to_be_bytes()), origin()).unwrap();
    assert_eq!(msg.content_type, ContentType::ShortReal);
    assert_eq!(msg.content, "12.34");

    let msg = decode(&datagram("humidity", 1, &5u16.to_be_bytes()), origin()).unwrap();
    assert_eq!(msg.content, "0.05");
}

#[test]
fn test_decode_float() {
    let mut content = vec![0u8];
    content.extend_from_slice(&3141u32.to_be_bytes());
    content.push(3);
    let msg = decode(&datagram("pi", 2, &content), origin()).unwrap();
    assert_eq!(msg.content_type, ContentType::Float);
    assert_eq!(msg.content, "3.141000");
}

#[test]
fn test_decode_negative_float() {
    let mut content = vec![1u8];
    content.extend_from_slice(&12345u32.to_be_bytes());
    content.push(2);
    let msg = decode(&datagram("delta", 2, &content), origin()).unwrap();
    assert_eq!(msg.content, "-123.450000");
}

#[test]
fn test_decode_string_stops_at_nul() {
    let msg = decode(&datagram("greeting", 3, b"hello\0garbage"), origin()).unwrap();
    assert_eq!(msg.content_type, ContentType::String);
    assert_eq!(msg.content, "hello");
}

#[test]
fn test_decode_string_keeps_raw_bytes() {
    let msg = decode(&datagram("raw", 3, b"\xff\xfeok\0tail"), origin()).unwrap();
    assert_eq!(msg.content, &b"\xff\xfeok"[..]);

    let frame = wire::encode_message(&msg);
    let content_at = wire::TYPE_NAME_LEN + wire::MESSAGE_TOPIC_LEN;
    assert_eq!(&frame[content_at..content_at + 5], b"\xff\xfeok\0");
    assert_eq!(wire::decode_message(&frame).unwrap().content, msg.content);
}

#[test]
fn test_decode_rejects_non_utf8_topic() {
    let mut bytes = datagram("", 3, b"x");
    bytes[..3].copy_from_slice(b"t\xffa");
    assert_eq!(
        decode(&bytes, origin()),
        Err(CodecError::InvalidUtf8 { field: "topic" })
    );
}

#[test]
fn test_topics_differing_only_in_invalid_bytes_do_not_merge() {
    let mut first = datagram("", 3, b"x");
    first[..2].copy_from_slice(b"\xfe\xff");
    let mut second = datagram("", 3, b"x");
    second[..2].copy_from_slice(b"\xff\xfe");
    assert!(decode(&first, origin()).is_err());
    assert!(decode(&second, origin()).is_err());
}

#[test]
fn test_content_type_tags_and_names() {
    for content_type in [
        ContentType::Int,
        ContentType::ShortReal,
        ContentType::Float,
        ContentType::String,
    ] {
        assert_eq!(ContentType::from_tag(content_type.tag()), Some(content_type));
        assert_eq!(ContentType::from_name(content_type.as_str()), Some(content_type));
    }
    assert_eq!(ContentType::String.tag(), 3);
    assert_eq!(ContentType::from_tag(4), None);
}

#[test]
fn test_full_size_datagram_with_unterminated_topic() {
    let topic = "t".repeat(TOPIC_LEN);
    let mut bytes = datagram(&topic, 3, b"x");
    bytes.resize(DATAGRAM_LEN, 0);

    let packet = RawPublishPacket::new(&bytes).unwrap();
    assert_eq!(packet.topic().unwrap().len(), TOPIC_LEN);
    assert_eq!(packet.type_tag(), 3);

    let msg = decode(&bytes, origin()).unwrap();
    assert_eq!(msg.topic, topic);
    assert_eq!(msg.content, "x");
}

#[test]
fn test_decode_rejects_short_header() {
    let err = decode(&[0u8; 10], origin()).unwrap_err();
    assert_eq!(
        err,
        CodecError::TruncatedHeader {
            len: 10,
            needed: TOPIC_LEN + 1
        }
    );
}

#[test]
fn test_decode_rejects_truncated_int() {
    let err = decode(&datagram("temp", 0, &[0, 0, 1]), origin()).unwrap_err();
    assert!(matches!(err, CodecError::TruncatedContent { needed: 5, len: 3, .. }));
}

#[test]
fn test_decode_rejects_unknown_type() {
    let err = decode(&datagram("temp", 9, &[]), origin()).unwrap_err();
    assert_eq!(err, CodecError::UnknownContentType(9));
}

#[test]
fn test_identity_decoding() {
    assert_eq!(wire::decode_identity(b"C1\0\0\0\0\0\0\0\0").unwrap(), "C1");
    assert_eq!(wire::decode_identity(b"0123456789").unwrap(), "0123456789");
    assert_eq!(wire::decode_identity(&[0u8; IDENTITY_LEN]), Err(CodecError::EmptyIdentity));
    assert_eq!(wire::encode_identity("C1").len(), IDENTITY_LEN);
    assert_eq!(
        wire::decode_identity(b"C\xff\0\0\0\0\0\0\0\0"),
        Err(CodecError::InvalidUtf8 { field: "identity" })
    );
}

#[test]
fn test_command_layout() {
    let frame = wire::encode_command(&SubscriberCommand::Subscribe {
        topic: "temp".to_string(),
        store_and_forward: true,
    });
    assert_eq!(frame.len(), COMMAND_LEN);
    assert_eq!(frame[0], 0);
    assert_eq!(&frame[1..5], b"temp");
    assert_eq!(frame[5], 0);
    assert_eq!(frame[COMMAND_LEN - 1], 1);

    assert_eq!(
        wire::decode_command(&frame).unwrap(),
        SubscriberCommand::Subscribe {
            topic: "temp".to_string(),
            store_and_forward: true
        }
    );
}

#[test]
fn test_command_decoding_variants() {
    let mut frame = [0u8; COMMAND_LEN];
    frame[0] = 1;
    frame[1..5].copy_from_slice(b"news");
    assert_eq!(
        wire::decode_command(&frame).unwrap(),
        SubscriberCommand::Unsubscribe {
            topic: "news".to_string()
        }
    );

    frame[0] = 2;
    assert_eq!(wire::decode_command(&frame).unwrap(), SubscriberCommand::Exit);

    frame[1] = 0xfe;
    assert_eq!(
        wire::decode_command(&frame),
        Err(CodecError::InvalidUtf8 { field: "topic" })
    );
    frame[1] = b'n';

    frame[0] = 7;
    assert_eq!(wire::decode_command(&frame), Err(CodecError::UnknownCommand(7)));
    assert!(matches!(
        wire::decode_command(&frame[..10]),
        Err(CodecError::BadRecordLength { len: 10, .. })
    ));
}

#[test]
fn test_message_record_layout() {
    let msg = CanonicalMessage {
        content_type: ContentType::ShortReal,
        topic: "humidity".to_string(),
        content: Bytes::from_static(b"12.34"),
        origin: "192.168.1.20:5000".parse().unwrap(),
    };
    let frame = wire::encode_message(&msg);
    assert_eq!(frame.len(), MESSAGE_LEN);
    assert_eq!(MESSAGE_LEN, 1582);
    assert_eq!(&frame[..10], b"SHORT_REAL");
    assert_eq!(frame[10], 0);
    assert_eq!(&frame[11..19], b"humidity");
    assert_eq!(&frame[MESSAGE_LEN - 2..], &5000u16.to_be_bytes());

    assert_eq!(wire::decode_message(&frame).unwrap(), msg);
}

#[test]
fn test_message_record_truncates_long_content() {
    let msg = CanonicalMessage {
        content_type: ContentType::String,
        topic: "t".to_string(),
        content: Bytes::from("a".repeat(4000)),
        origin: origin(),
    };
    let frame = wire::encode_message(&msg);
    assert_eq!(frame.len(), MESSAGE_LEN);
    let back = wire::decode_message(&frame).unwrap();
    assert_eq!(back.content.len(), wire::MESSAGE_CONTENT_LEN - 1);
}
