use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;

use crate::broker::message::CanonicalMessage;
use crate::broker::topic::SubscriberId;

/// Handle the event loop assigns to every accepted subscriber connection.
pub type ConnectionId = u64;

/// A live subscriber connection as seen by the broker.
///
/// Messages pushed into `sender` are written to the socket, in order, by the
/// connection's writer task. A closed channel means the socket is gone.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub sender: UnboundedSender<CanonicalMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId, peer: SocketAddr, sender: UnboundedSender<CanonicalMessage>) -> Self {
        Self { id, peer, sender }
    }
}

/// One topic a client listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSubscription {
    pub topic: String,
    pub store_and_forward: bool,
}

/// A message kept for an offline client, stamped when it was queued.
#[derive(Debug, Clone)]
pub struct BufferedMessage {
    pub message: CanonicalMessage,
    pub queued_at: DateTime<Utc>,
}

/// Everything the broker knows about one subscriber identity.
///
/// Records are created on the first connection of an identity and live for
/// the rest of the process. A record is online exactly when it holds a
/// [`Connection`].
#[derive(Debug)]
pub struct ClientRecord {
    pub id: SubscriberId,
    connection: Option<Connection>,
    pending: VecDeque<BufferedMessage>,
    subscriptions: HashMap<String, TopicSubscription>,
}

impl ClientRecord {
    pub fn new(id: impl Into<SubscriberId>) -> Self {
        Self {
            id: id.into(),
            connection: None,
            pending: VecDeque::new(),
            subscriptions: HashMap::new(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn subscription(&self, topic: &str) -> Option<&TopicSubscription> {
        self.subscriptions.get(topic)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &TopicSubscription> {
        self.subscriptions.values()
    }

    /// Messages waiting for the next reconnect, oldest first.
    pub fn pending(&self) -> impl ExactSizeIterator<Item = &BufferedMessage> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn attach(&mut self, connection: Connection) -> Option<Connection> {
        self.connection.replace(connection)
    }

    pub(crate) fn detach(&mut self) -> Option<Connection> {
        self.connection.take()
    }

    /// Returns `false` when the topic was already subscribed; the existing
    /// subscription keeps its flag.
    pub(crate) fn subscribe(&mut self, topic: &str, store_and_forward: bool) -> bool {
        if self.subscriptions.contains_key(topic) {
            return false;
        }
        self.subscriptions.insert(
            topic.to_string(),
            TopicSubscription {
                topic: topic.to_string(),
                store_and_forward,
            },
        );
        true
    }

    pub(crate) fn unsubscribe(&mut self, topic: &str) -> bool {
        self.subscriptions.remove(topic).is_some()
    }

    /// Queues `message` for later replay. With a non-zero `limit` the oldest
    /// entry is evicted once the queue is full; the evicted message is
    /// returned.
    pub(crate) fn enqueue(
        &mut self,
        message: CanonicalMessage,
        limit: usize,
    ) -> Option<BufferedMessage> {
        self.enqueue_at(message, limit, Utc::now())
    }

    /// Same as [`enqueue`](Self::enqueue) with an explicit queue time.
    pub(crate) fn enqueue_at(
        &mut self,
        message: CanonicalMessage,
        limit: usize,
        queued_at: DateTime<Utc>,
    ) -> Option<BufferedMessage> {
        let evicted = if limit > 0 && self.pending.len() >= limit {
            self.pending.pop_front()
        } else {
            None
        };
        self.pending.push_back(BufferedMessage { message, queued_at });
        evicted
    }

    /// Empties the replay queue, handing back everything in arrival order.
    pub(crate) fn take_pending(&mut self) -> VecDeque<BufferedMessage> {
        std::mem::take(&mut self.pending)
    }

    /// Puts messages that could not be replayed back in front of the queue.
    pub(crate) fn restore_pending(&mut self, mut unsent: VecDeque<BufferedMessage>) {
        unsent.append(&mut self.pending);
        self.pending = unsent;
    }
}
