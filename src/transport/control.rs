//! Operator control input: the `exit` console command and Ctrl-C.

use std::io::BufRead;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::transport::message::ControlCommand;

/// Starts every control source and returns the channel the event loop
/// listens on.
pub fn spawn_console() -> UnboundedReceiver<ControlCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    spawn_stdin(tx.clone());
    spawn_ctrl_c(tx);
    rx
}

/// Console lines are read on a plain thread: a blocking stdin read inside
/// the runtime would hold up shutdown until the next newline.
fn spawn_stdin(tx: UnboundedSender<ControlCommand>) {
    let spawned = std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match ControlCommand::parse(&line) {
                    Some(command) => {
                        let _ = tx.send(command);
                        return;
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown console command {:?}", line.trim()),
                }
            }
            debug!("console input closed");
        });
    if let Err(e) = spawned {
        warn!("console disabled, could not start reader thread: {e}");
    }
}

fn spawn_ctrl_c(tx: UnboundedSender<ControlCommand>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(ControlCommand::Shutdown);
        }
    });
}
