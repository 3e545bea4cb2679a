//! The `client` module defines what the broker keeps per subscriber.
//!
//! A [`ClientRecord`] survives disconnects: it carries the client's
//! subscriptions and the messages buffered for it while it was offline, and
//! optionally the [`Connection`] it is currently reachable on.

pub mod record;

pub use record::{BufferedMessage, ClientRecord, Connection, ConnectionId, TopicSubscription};
