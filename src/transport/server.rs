//! The relay's event loop.
//!
//! Everything that touches broker state runs here, one event at a time,
//! behind a single `select!`. Sources are polled in a fixed priority:
//! operator control, subscriber commands, new subscriber connections,
//! publisher datagrams.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::client::{Connection, ConnectionId};
use crate::codec::wire::{self, IDENTITY_LEN};
use crate::codec::{self, DATAGRAM_LEN};
use crate::config::Settings;
use crate::transport::connection::{spawn_reader, spawn_writer};
use crate::transport::message::{ConnectionEvent, ControlCommand, SubscriberCommand};
use crate::utils::{RelayError, Result};

/// Bound endpoints plus the broker they feed.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    socket: UdpSocket,
    broker: Broker,
    identify_timeout: Duration,
    next_connection: ConnectionId,
}

impl Server {
    /// Binds the subscriber listener and the publish socket on the same
    /// `host:port`. With port 0 the UDP socket follows whatever port the
    /// listener got.
    pub async fn bind(settings: &Settings) -> Result<Self> {
        let addr = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| RelayError::bind("tcp", &addr, e))?;
        let port = listener
            .local_addr()
            .map_err(|source| RelayError::LocalAddr {
                endpoint: "tcp",
                source,
            })?
            .port();

        let udp_addr = format!("{}:{}", settings.server.host, port);
        let socket = UdpSocket::bind(&udp_addr)
            .await
            .map_err(|e| RelayError::bind("udp", &udp_addr, e))?;

        info!("listening for subscribers on tcp://{addr} and publishers on udp://{udp_addr}");

        Ok(Self {
            listener,
            socket,
            broker: Broker::new(settings.broker.clone()),
            identify_timeout: Duration::from_millis(settings.broker.identify_timeout_ms),
            next_connection: 0,
        })
    }

    pub fn tcp_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|source| RelayError::LocalAddr {
                endpoint: "tcp",
                source,
            })
    }

    pub fn udp_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|source| RelayError::LocalAddr {
                endpoint: "udp",
                source,
            })
    }

    /// Runs until a [`ControlCommand::Shutdown`] arrives or a shared
    /// endpoint fails. Returns the broker so callers can inspect the final
    /// state; all connections are closed by then.
    pub async fn run(mut self, mut control: UnboundedReceiver<ControlCommand>) -> Result<Broker> {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut datagram = vec![0u8; DATAGRAM_LEN];
        let mut control_open = true;

        loop {
            tokio::select! {
                biased;

                command = control.recv(), if control_open => match command {
                    Some(ControlCommand::Shutdown) => {
                        info!("shutdown requested");
                        break;
                    }
                    None => {
                        debug!("control input closed");
                        control_open = false;
                    }
                },

                Some(event) = events_rx.recv() => self.on_connection_event(event),

                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.map_err(RelayError::Accept)?;
                    self.admit(stream, peer, &events_tx).await;
                }

                received = self.socket.recv_from(&mut datagram) => {
                    let (len, origin) = received.map_err(RelayError::Receive)?;
                    match codec::decode(&datagram[..len], origin) {
                        Ok(msg) => {
                            self.broker.publish(msg);
                        }
                        Err(e) => warn!(%origin, "dropping datagram: {e}"),
                    }
                }
            }
        }

        self.broker.shutdown();
        Ok(self.broker)
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Command {
                connection,
                command,
            } => match command {
                SubscriberCommand::Subscribe {
                    topic,
                    store_and_forward,
                } => {
                    self.broker.subscribe(connection, &topic, store_and_forward);
                }
                SubscriberCommand::Unsubscribe { topic } => {
                    self.broker.unsubscribe(connection, &topic);
                }
                SubscriberCommand::Exit => {
                    self.broker.disconnect(connection);
                }
            },
            ConnectionEvent::Closed { connection } => {
                self.broker.disconnect(connection);
            }
        }
    }

    /// Reads the identity of a new connection and hands it to the broker.
    /// Connections the broker does not take over are dropped (closed) here.
    async fn admit(
        &mut self,
        mut stream: TcpStream,
        peer: SocketAddr,
        events: &UnboundedSender<ConnectionEvent>,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, "could not set TCP_NODELAY: {e}");
        }

        let mut identity = [0u8; IDENTITY_LEN];
        match timeout(self.identify_timeout, stream.read_exact(&mut identity)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!(%peer, "connection closed before identification: {e}");
                return;
            }
            Err(_) => {
                warn!(%peer, "no identity within {:?}, closing", self.identify_timeout);
                return;
            }
        }
        let id = match wire::decode_identity(&identity) {
            Ok(id) => id,
            Err(e) => {
                warn!(%peer, "rejecting connection: {e}");
                return;
            }
        };

        let connection = self.next_connection;
        self.next_connection += 1;
        let (tx, rx) = mpsc::unbounded_channel();

        let outcome = self
            .broker
            .connect(&id, Connection::new(connection, peer, tx));
        if !outcome.is_accepted() {
            return;
        }
        debug!(client = %id, connection, ?outcome, "subscriber admitted");

        let (reader, writer) = stream.into_split();
        spawn_writer(connection, writer, rx);
        spawn_reader(connection, reader, events.clone());
    }
}
