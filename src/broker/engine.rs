//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - tracking subscriber records and their subscriptions (via [`Registry`])
//! - delivering published messages to online subscribers
//! - buffering messages for offline subscribers that asked for
//!   store-and-forward
//!
//! The broker is plain synchronous state owned by the event loop. Delivery
//! never waits on a socket: each online subscriber has an outbound channel
//! drained by its own writer task.

use tracing::{debug, info, warn};

use crate::broker::message::CanonicalMessage;
use crate::broker::registry::Registry;
use crate::broker::topic::SubscriberId;
use crate::client::ConnectionId;
use crate::config::BrokerSettings;

/// What happened to one published message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Handed to an online subscriber's connection.
    pub delivered: usize,
    /// Queued for an offline store-and-forward subscriber.
    pub buffered: usize,
    /// Discarded for an offline subscriber without store-and-forward.
    pub dropped: usize,
    /// Older buffered messages pushed out by `max_buffered_messages`.
    pub evicted: usize,
}

#[derive(Debug, Default)]
pub struct Broker {
    pub(crate) registry: Registry,
    pub(crate) settings: BrokerSettings,
}

impl Broker {
    pub fn new(settings: BrokerSettings) -> Self {
        Self {
            registry: Registry::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Subscribes the client behind `connection` to `topic`.
    ///
    /// Subscribing twice to the same topic is a no-op and keeps the first
    /// store-and-forward flag. Returns whether a subscription was added.
    pub fn subscribe(&mut self, connection: ConnectionId, topic: &str, store_and_forward: bool) -> bool {
        let Some(id) = self.registry.identity_of(connection).cloned() else {
            warn!(connection, topic, "subscribe from unidentified connection ignored");
            return false;
        };
        let added = self.registry.add_subscription(&id, topic, store_and_forward);
        debug!(client = %id, topic, store_and_forward, added, "subscribe");
        added
    }

    /// Removes the subscription if there is one.
    pub fn unsubscribe(&mut self, connection: ConnectionId, topic: &str) -> bool {
        let Some(id) = self.registry.identity_of(connection).cloned() else {
            warn!(connection, topic, "unsubscribe from unidentified connection ignored");
            return false;
        };
        let removed = self.registry.remove_subscription(&id, topic);
        if !removed {
            warn!(client = %id, topic, "unsubscribe for a topic that was not subscribed");
        }
        removed
    }

    /// Routes `msg` to every subscriber of its topic.
    ///
    /// Online subscribers get it on their connection right away. Offline
    /// subscribers get it queued if their subscription has store-and-forward
    /// set, otherwise it is dropped for them. A subscriber whose connection
    /// turns out to be gone is taken offline and treated like any other
    /// offline subscriber for this message.
    pub fn publish(&mut self, msg: CanonicalMessage) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let recipients: Vec<SubscriberId> =
            self.registry.subscribers_of(&msg.topic).cloned().collect();
        let mut broken = Vec::new();

        for id in recipients {
            let Some(record) = self.registry.find_mut(&id) else {
                continue;
            };
            let Some(subscription) = record.subscription(&msg.topic) else {
                continue;
            };
            let store_and_forward = subscription.store_and_forward;

            if let Some(connection) = record.connection() {
                if connection.sender.send(msg.clone()).is_ok() {
                    report.delivered += 1;
                    continue;
                }
                warn!(client = %id, connection = connection.id, "connection lost during delivery");
                broken.push(id.clone());
            }

            if store_and_forward {
                if let Some(evicted) = record.enqueue(msg.clone(), self.settings.max_buffered_messages) {
                    debug!(client = %id, topic = %evicted.message.topic, "buffer full, oldest message evicted");
                    report.evicted += 1;
                }
                report.buffered += 1;
            } else {
                report.dropped += 1;
            }
        }

        for id in broken {
            if self.registry.mark_offline(&id).is_some() {
                info!("Client {} disconnected.", id);
            }
        }

        debug!(
            topic = %msg.topic,
            delivered = report.delivered,
            buffered = report.buffered,
            dropped = report.dropped,
            "published"
        );
        report
    }
}
