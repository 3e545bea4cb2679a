//! The `transport` module is responsible for network communication with
//! publishers and subscribers.
//!
//! It owns the event loop ([`server`]), the per-connection reader and writer
//! tasks ([`connection`]), the operator control input ([`control`]) and the
//! events passed between them ([`message`]).

pub mod connection;
pub mod control;
pub mod message;
pub mod server;

pub use server::Server;
