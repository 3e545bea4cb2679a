//! # topic-relay
//!
//! `topic-relay` bridges two protocols: publishers fire fixed-format UDP
//! datagrams carrying typed values tagged with a topic, and subscribers keep
//! TCP connections open, declare the topics they care about and receive
//! every matching value as a text-rendered record. Subscribers may ask for
//! store-and-forward, in which case values published while they are away are
//! replayed, in order, when they reconnect under the same identity.
//!
//! ## Core Modules
//!
//! - `broker`: client registry, delivery and the connect/disconnect lifecycle.
//! - `client`: the per-subscriber record the broker keeps across reconnects.
//! - `codec`: publisher datagram decoding and the subscriber wire records.
//! - `config`: layered configuration loading.
//! - `transport`: the single-threaded event loop and connection tasks.
//! - `utils`: error type and logging bootstrap.

pub mod broker;
pub mod client;
pub mod codec;
pub mod config;
pub mod transport;
pub mod utils;
