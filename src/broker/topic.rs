use std::collections::HashSet;

pub type SubscriberId = String;

/// Reverse index entry: a topic name and every client subscribed to it.
///
/// The per-client view (with the store-and-forward flag) lives on the
/// client record; this set only answers "who listens on this topic".
#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: HashSet<SubscriberId>,
}

impl Topic {
    /// Creates a new instance of the Topic with the given name
    /// Initializes an empty set of subscribers
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashSet::new(),
        }
    }

    /// Adds the subscriber's ID to the set of subscribers.
    /// If the subscriber is already subscribed, it has no effect
    pub fn subscribe(&mut self, id: SubscriberId) {
        self.subscribers.insert(id);
    }

    /// If the subscriber is not subscribed, it has no effect
    pub fn unsubscribe(&mut self, id: &SubscriberId) {
        self.subscribers.remove(id);
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
