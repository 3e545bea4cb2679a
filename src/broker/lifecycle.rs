//! Connect / reconnect / disconnect transitions of subscriber identities.
//!
//! Unknown -> Online on the first connection, Online -> Offline on exit or
//! end-of-stream, Offline -> Online on reconnect (with buffered replay). A
//! second connection for an identity that is already online is refused.

use chrono::{TimeDelta, Utc};
use tracing::{info, warn};

use super::engine::Broker;
use crate::broker::topic::SubscriberId;
use crate::client::{BufferedMessage, Connection, ConnectionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// First connection ever seen for this identity.
    Connected,
    /// A known identity came back; `replayed` buffered messages were sent
    /// and `expired` were discarded for exceeding `message_ttl_secs`.
    Reconnected { replayed: usize, expired: usize },
    /// The identity is already online; the new connection must be closed.
    AlreadyConnected,
    /// `max_connections` subscribers are online already.
    Refused,
}

impl ConnectOutcome {
    /// Whether the connection was taken over by the broker.
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConnectOutcome::Connected | ConnectOutcome::Reconnected { .. })
    }
}

impl Broker {
    /// Brings `id` online on `connection`.
    ///
    /// When the outcome is not accepted the connection is dropped here,
    /// which closes its outbound channel.
    pub fn connect(&mut self, id: &str, connection: Connection) -> ConnectOutcome {
        let peer = connection.peer;
        let known = match self.registry.find(id) {
            Some(record) if record.is_online() => {
                info!("Client {} already connected.", id);
                return ConnectOutcome::AlreadyConnected;
            }
            Some(_) => true,
            None => false,
        };

        if self.registry.online_count() >= self.settings.max_connections {
            warn!(
                client = id,
                max_connections = self.settings.max_connections,
                "connection limit reached, refusing client"
            );
            return ConnectOutcome::Refused;
        }

        self.registry.find_or_create(id);
        self.registry.mark_online(id, connection);
        info!("New client {} connected from {}:{}.", id, peer.ip(), peer.port());

        if !known {
            return ConnectOutcome::Connected;
        }
        let (replayed, expired) = self.replay_pending(id);
        ConnectOutcome::Reconnected { replayed, expired }
    }

    /// Takes the client behind `connection` offline. Returns its identity,
    /// or `None` if the connection is not (or no longer) registered.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Option<SubscriberId> {
        let id = self.registry.identity_of(connection)?.clone();
        self.registry.mark_offline(&id);
        info!("Client {} disconnected.", id);
        Some(id)
    }

    /// Closes every live connection. Records stay in memory but nothing is
    /// kept past the process.
    pub fn shutdown(&mut self) -> usize {
        let closed = self.registry.disconnect_all();
        info!(closed, "all subscriber connections closed");
        closed
    }

    /// Drains the buffer of a freshly reconnected client onto its
    /// connection. If the connection dies mid-way the rest stays buffered
    /// and the client goes back offline.
    fn replay_pending(&mut self, id: &str) -> (usize, usize) {
        let max_age = i64::try_from(self.settings.message_ttl_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(TimeDelta::try_seconds);

        let Some(record) = self.registry.find_mut(id) else {
            return (0, 0);
        };
        let Some(sender) = record.connection().map(|c| c.sender.clone()) else {
            return (0, 0);
        };

        let mut pending = record.take_pending();
        let before = pending.len();
        if let Some(max_age) = max_age {
            let now = Utc::now();
            pending.retain(|buffered| now - buffered.queued_at <= max_age);
        }
        let expired = before - pending.len();

        let mut replayed = 0;
        while let Some(buffered) = pending.pop_front() {
            let queued_at = buffered.queued_at;
            if let Err(err) = sender.send(buffered.message) {
                pending.push_front(BufferedMessage {
                    message: err.0,
                    queued_at,
                });
                break;
            }
            replayed += 1;
        }

        if !pending.is_empty() {
            warn!(client = id, remaining = pending.len(), "connection lost during replay");
            record.restore_pending(pending);
            self.registry.mark_offline(id);
        }
        (replayed, expired)
    }
}
