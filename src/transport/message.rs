use crate::client::ConnectionId;

/// A request from an identified subscriber connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberCommand {
    Subscribe { topic: String, store_and_forward: bool },
    Unsubscribe { topic: String },
    Exit,
}

/// What a subscriber connection's reader task reports to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Command {
        connection: ConnectionId,
        command: SubscriberCommand,
    },
    /// End-of-stream or a read error; the peer is gone.
    Closed { connection: ConnectionId },
}

/// Requests coming from the operator side of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Shutdown,
}

impl ControlCommand {
    /// Parses one console line. Only `exit` is understood.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "exit" => Some(ControlCommand::Shutdown),
            _ => None,
        }
    }
}
