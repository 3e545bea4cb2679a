//! The `error` module defines the error type for failures that stop the relay.
//!
//! Protocol anomalies coming from peers never surface here; they are logged
//! and skipped where they happen. Everything in [`RelayError`] is fatal.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind {endpoint} endpoint on {addr}: {source}")]
    Bind {
        endpoint: &'static str,
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read local address of {endpoint} endpoint: {source}")]
    LocalAddr {
        endpoint: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("accept() on subscriber listener failed: {0}")]
    Accept(#[source] io::Error),

    #[error("recv_from() on publish socket failed: {0}")]
    Receive(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl RelayError {
    pub(crate) fn bind(endpoint: &'static str, addr: &str, source: io::Error) -> Self {
        RelayError::Bind {
            endpoint,
            addr: addr.to_string(),
            source,
        }
    }
}
