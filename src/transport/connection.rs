//! Per-connection reader and writer tasks.
//!
//! Neither task touches broker state. The reader turns socket bytes into
//! [`ConnectionEvent`]s for the event loop; the writer drains the outbound
//! channel held by the client's record onto the socket.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::broker::message::CanonicalMessage;
use crate::client::ConnectionId;
use crate::codec::wire::{self, COMMAND_LEN};
use crate::transport::message::{ConnectionEvent, SubscriberCommand};

/// Reads fixed-size command records until exit, end-of-stream or error.
pub fn spawn_reader(
    connection: ConnectionId,
    mut reader: OwnedReadHalf,
    events: UnboundedSender<ConnectionEvent>,
) {
    tokio::spawn(async move {
        let mut frame = [0u8; COMMAND_LEN];
        loop {
            match reader.read_exact(&mut frame).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!(connection, "peer closed the connection");
                    break;
                }
                Err(e) => {
                    warn!(connection, "subscriber recv() failed: {e}");
                    break;
                }
            }

            let command = match wire::decode_command(&frame) {
                Ok(command) => command,
                Err(e) => {
                    warn!(connection, "ignoring malformed command: {e}");
                    continue;
                }
            };
            let exit = command == SubscriberCommand::Exit;
            if events
                .send(ConnectionEvent::Command {
                    connection,
                    command,
                })
                .is_err()
                || exit
            {
                return;
            }
        }
        let _ = events.send(ConnectionEvent::Closed { connection });
    });
}

/// Writes every message the broker hands to this connection, in order.
/// Exits when the broker drops the sending side or the socket fails.
pub fn spawn_writer(
    connection: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut outbound: UnboundedReceiver<CanonicalMessage>,
) {
    tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let frame = wire::encode_message(&msg);
            if let Err(e) = writer.write_all(&frame).await {
                warn!(connection, "send() to subscriber failed: {e}");
                return;
            }
        }
        let _ = writer.shutdown().await;
        debug!(connection, "writer closed");
    });
}
