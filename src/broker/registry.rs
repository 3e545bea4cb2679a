//! Client and topic bookkeeping.
//!
//! Three indexes are kept in step: records by identity, identities by live
//! connection, and subscribers by topic. Nothing here performs I/O.

use std::collections::HashMap;

use crate::broker::topic::{SubscriberId, Topic};
use crate::client::{ClientRecord, Connection, ConnectionId};

#[derive(Debug, Default)]
pub struct Registry {
    clients: HashMap<SubscriberId, ClientRecord>,
    connections: HashMap<ConnectionId, SubscriberId>,
    topics: HashMap<String, Topic>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `id`, creating an offline one with no
    /// subscriptions if the identity has never been seen.
    pub fn find_or_create(&mut self, id: &str) -> &mut ClientRecord {
        self.clients
            .entry(id.to_string())
            .or_insert_with(|| ClientRecord::new(id))
    }

    pub fn find(&self, id: &str) -> Option<&ClientRecord> {
        self.clients.get(id)
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut ClientRecord> {
        self.clients.get_mut(id)
    }

    pub fn find_by_connection(&self, connection: ConnectionId) -> Option<&ClientRecord> {
        self.connections
            .get(&connection)
            .and_then(|id| self.clients.get(id))
    }

    pub fn identity_of(&self, connection: ConnectionId) -> Option<&SubscriberId> {
        self.connections.get(&connection)
    }

    /// Attaches `connection` to a known record. Returns `false` and drops
    /// the connection when the identity is unknown.
    pub fn mark_online(&mut self, id: &str, connection: Connection) -> bool {
        let Some(record) = self.clients.get_mut(id) else {
            return false;
        };
        let connection_id = connection.id;
        if let Some(previous) = record.attach(connection) {
            self.connections.remove(&previous.id);
        }
        self.connections.insert(connection_id, record.id.clone());
        true
    }

    /// Detaches and returns the record's connection. Buffer and
    /// subscriptions are left alone.
    pub fn mark_offline(&mut self, id: &str) -> Option<Connection> {
        let connection = self.clients.get_mut(id)?.detach()?;
        self.connections.remove(&connection.id);
        Some(connection)
    }

    /// Idempotent: returns `false` if the identity is unknown or the topic
    /// was already subscribed.
    pub fn add_subscription(&mut self, id: &str, topic: &str, store_and_forward: bool) -> bool {
        let Some(record) = self.clients.get_mut(id) else {
            return false;
        };
        if !record.subscribe(topic, store_and_forward) {
            return false;
        }
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(record.id.clone());
        true
    }

    /// Returns `false` when there was nothing to remove.
    pub fn remove_subscription(&mut self, id: &str, topic: &str) -> bool {
        let Some(record) = self.clients.get_mut(id) else {
            return false;
        };
        if !record.unsubscribe(topic) {
            return false;
        }
        if let Some(entry) = self.topics.get_mut(topic) {
            entry.unsubscribe(&record.id);
            if entry.is_empty() {
                self.topics.remove(topic);
            }
        }
        true
    }

    /// Identities subscribed to exactly `topic`, in no particular order.
    pub fn subscribers_of(&self, topic: &str) -> impl Iterator<Item = &SubscriberId> {
        self.topics
            .get(topic)
            .into_iter()
            .flat_map(|t| t.subscribers.iter())
    }

    pub fn online_count(&self) -> usize {
        self.connections.len()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Drops every live connection, leaving all records offline.
    pub(crate) fn disconnect_all(&mut self) -> usize {
        self.connections.clear();
        self.clients
            .values_mut()
            .filter_map(|record| record.detach())
            .count()
    }
}
