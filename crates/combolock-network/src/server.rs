//! TCP server for the actuator bridge.
//!
//! The actuator board connects to this server (directly or through a USB
//! port forward) and receives every command the controller issues. The
//! server owns the listening socket and all peer sockets; the controller
//! only ever talks to an [`ActuatorHandle`].
//!
//! # Architecture
//!
//! ```text
//!                       ┌──────────────┐
//! LockController ──────►│ActuatorHandle│── broadcast ──┬──► peer task ──► Actuator board
//!   (try_send)          └──────────────┘               │
//!                                                      └──► peer task ──► (second bridge)
//!                       ┌──────────────┐
//!                       │ActuatorServer│── accept ──► spawns peer tasks
//!                       └──────────────┘
//! ```
//!
//! Commands fan out over a `tokio::sync::broadcast` channel. Each peer task
//! owns one `Framed<TcpStream, ServoCodec>` and writes every command it
//! receives. `try_send` never waits for the write: delivery failures are
//! logged by the peer task and never reach the controller.
//!
//! # Example Usage
//!
//! ```no_run
//! use combolock_network::{ActuatorServer, ActuatorServerConfig, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ActuatorServerConfig {
//!     bind_addr: "0.0.0.0:4567".parse()?,
//!     ..Default::default()
//! };
//!
//! let server = ActuatorServer::bind(config).await?;
//! let handle = server.handle();
//! tokio::spawn(server.run());
//!
//! if handle.peer_count() > 0 {
//!     handle.try_send(&[5, 175])?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No authentication**: any peer that connects receives commands
//! - **No TLS**: the command channel is plain bytes
//! - **No acknowledgment**: the wire format has none
//! - **Fan-out**: every connected peer receives every command

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinSet;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use combolock_core::constants::{
    DEFAULT_ACTUATOR_PORT, DEFAULT_MAX_CONNECTIONS, DEFAULT_QUEUE_CAPACITY, FRAME_SIZE,
};
use combolock_protocol::{ActuatorCommand, ServoCodec};

use crate::transport::{Transport, TransportError};

/// Pause before accepting again after a resource error such as EMFILE.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Configuration for the actuator server
///
/// # Example
///
/// ```
/// use combolock_network::ActuatorServerConfig;
///
/// let config = ActuatorServerConfig::default();
/// assert_eq!(config.bind_addr.port(), 4567);
/// ```
#[derive(Debug, Clone)]
pub struct ActuatorServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Maximum number of simultaneous peer connections
    pub max_connections: usize,

    /// Number of commands a slow peer may fall behind before it misses some
    pub queue_capacity: usize,
}

impl Default for ActuatorServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_ACTUATOR_PORT)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Identifier assigned to each accepted peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Metadata kept for each live peer
#[derive(Debug, Clone)]
struct PeerInfo {
    addr: SocketAddr,
    connected_at: DateTime<Utc>,
}

/// Errors that can occur while running the actuator server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("Failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-blocking sending side of a running [`ActuatorServer`]
///
/// Cloning the handle is cheap. All clones feed the same server.
#[derive(Debug, Clone)]
pub struct ActuatorHandle {
    commands: broadcast::Sender<ActuatorCommand>,
}

impl ActuatorHandle {
    /// Number of peers currently subscribed to commands.
    pub fn peer_count(&self) -> usize {
        self.commands.receiver_count()
    }

    /// Queue a command for every connected peer.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NoPeer` if no peer is connected.
    pub fn send_command(&self, command: ActuatorCommand) -> Result<(), TransportError> {
        match self.commands.send(command) {
            Ok(peers) => {
                trace!(%command, peers, "Queued actuator command");
                Ok(())
            }
            Err(_) => Err(TransportError::NoPeer),
        }
    }
}

impl Transport for ActuatorHandle {
    fn try_send(&self, frame: &[u8]) -> Result<(), TransportError> {
        let command =
            ActuatorCommand::from_bytes(frame).map_err(|_| TransportError::InvalidFrame {
                expected: FRAME_SIZE,
                actual: frame.len(),
            })?;
        self.send_command(command)
    }
}

/// TCP server the actuator bridge connects to
///
/// # Connection Lifecycle
///
/// 1. Bind server with `bind()`
/// 2. Take one or more handles with `handle()`
/// 3. Drive the accept loop with `run()` or `run_until()`
/// 4. Peers are dropped when they disconnect or a write fails
pub struct ActuatorServer {
    /// TCP listener for accepting new connections
    listener: TcpListener,

    /// Sender shared with every handle; peers subscribe to it
    commands: broadcast::Sender<ActuatorCommand>,

    /// Live peers indexed by id
    peers: HashMap<PeerId, PeerInfo>,

    /// Id handed to the next accepted peer
    next_peer_id: u64,

    /// Server configuration
    config: ActuatorServerConfig,
}

impl ActuatorServer {
    /// Bind the server to the configured address
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Address is already in use
    /// - Permission denied (e.g., binding to privileged port)
    pub async fn bind(config: ActuatorServerConfig) -> Result<Self, ServerError> {
        info!("Binding actuator server to {}", config.bind_addr);

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: config.bind_addr,
                source,
            })?;

        info!(
            "Actuator server listening on {} (max {} connections)",
            listener.local_addr().unwrap_or(config.bind_addr),
            config.max_connections
        );

        let (commands, _) = broadcast::channel(config.queue_capacity.max(1));

        Ok(Self {
            listener,
            commands,
            peers: HashMap::new(),
            next_peer_id: 1,
            config,
        })
    }

    /// Get a handle that queues commands for this server
    pub fn handle(&self) -> ActuatorHandle {
        ActuatorHandle {
            commands: self.commands.clone(),
        }
    }

    /// Get the local address the server is bound to
    ///
    /// This is useful for tests that bind to port 0 (OS-assigned random port).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Accept peers until the listener fails fatally.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Accept peers until `shutdown` completes.
    ///
    /// Failed accepts are logged and retried. Only an error that leaves the
    /// listener unusable ends the loop early. All peer connections are
    /// closed when this returns.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ServerError> {
        let mut tasks: JoinSet<PeerId> = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(peers = self.peers.len(), "Actuator server shutting down");
                    tasks.shutdown().await;
                    return Ok(());
                }

                accept_result = self.listener.accept() => {
                    if let Err(e) = self.on_accept(accept_result, &mut tasks).await {
                        tasks.shutdown().await;
                        return Err(e);
                    }
                }

                Some(joined) = tasks.join_next() => {
                    match joined {
                        Ok(peer_id) => self.forget(peer_id),
                        Err(e) => error!(error = %e, "Peer task failed"),
                    }
                }
            }
        }
    }

    /// Admit an accepted connection or recover from a failed accept.
    async fn on_accept(
        &mut self,
        accepted: io::Result<(TcpStream, SocketAddr)>,
        tasks: &mut JoinSet<PeerId>,
    ) -> Result<(), ServerError> {
        let e = match accepted {
            Ok((stream, addr)) => {
                self.admit(stream, addr, tasks);
                return Ok(());
            }
            Err(e) => e,
        };

        match e.kind() {
            // The pending connection died; the listener is fine
            io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock => {
                debug!(error = %e, "Pending connection failed before accept");
                Ok(())
            }
            io::ErrorKind::InvalidInput => {
                error!(error = %e, "Actuator listener is no longer usable");
                Err(e.into())
            }
            _ => {
                error!(
                    error = %e,
                    backoff_ms = ACCEPT_BACKOFF.as_millis() as u64,
                    "Accept failed, retrying"
                );
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                Ok(())
            }
        }
    }

    fn admit(&mut self, stream: TcpStream, addr: SocketAddr, tasks: &mut JoinSet<PeerId>) {
        debug!("Accepted new connection from {}", addr);

        if self.peers.len() >= self.config.max_connections {
            error!(
                addr = %addr,
                max_connections = self.config.max_connections,
                current_connections = self.peers.len(),
                "Connection rejected: maximum connections reached"
            );
            drop(stream);
            return;
        }

        // Commands are tiny; do not let Nagle hold them back
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }

        let peer_id = PeerId(self.next_peer_id);
        self.next_peer_id += 1;

        let framed = Framed::new(stream, ServoCodec::new());
        let receiver = self.commands.subscribe();
        tasks.spawn(serve_peer(peer_id, framed, receiver));

        self.peers.insert(
            peer_id,
            PeerInfo {
                addr,
                connected_at: Utc::now(),
            },
        );

        info!(
            "Actuator {} connected from {} (total: {})",
            peer_id,
            addr,
            self.peers.len()
        );
    }

    fn forget(&mut self, peer_id: PeerId) {
        if let Some(info) = self.peers.remove(&peer_id) {
            let uptime = Utc::now() - info.connected_at;
            info!(
                "Actuator {} at {} disconnected after {}s (total: {})",
                peer_id,
                info.addr,
                uptime.num_seconds(),
                self.peers.len()
            );
        }
    }
}

/// Write every broadcast command to one peer until it goes away.
///
/// Bytes arriving from the peer are decoded and logged only; they never
/// feed back into the controller.
async fn serve_peer(
    peer_id: PeerId,
    mut framed: Framed<TcpStream, ServoCodec>,
    mut commands: broadcast::Receiver<ActuatorCommand>,
) -> PeerId {
    loop {
        tokio::select! {
            received = commands.recv() => match received {
                Ok(command) => {
                    if let Err(e) = framed.send(command).await {
                        warn!(
                            peer = %peer_id,
                            %command,
                            error = %e,
                            "Failed to deliver actuator command (connection closed)"
                        );
                        break;
                    }
                    trace!(peer = %peer_id, %command, "Delivered actuator command");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(peer = %peer_id, skipped, "Peer fell behind, commands skipped");
                }
                Err(RecvError::Closed) => break,
            },

            inbound = framed.next() => match inbound {
                Some(Ok(frame)) => {
                    trace!(peer = %peer_id, %frame, "Ignoring inbound frame from actuator");
                }
                Some(Err(e)) => {
                    warn!(
                        peer = %peer_id,
                        error = %e,
                        "Read error from actuator (connection closed)"
                    );
                    break;
                }
                None => break,
            },
        }
    }

    peer_id
}
