//! TCP client for the actuator side of the link.
//!
//! `ActuatorClient` is what the actuator bridge does: connect to the
//! controller's server and read two-byte command frames. The real bridge is
//! firmware; this client stands in for it in integration tests and when the
//! host runs with an emulated servo.
//!
//! # Example Usage
//!
//! ```no_run
//! use combolock_network::{ActuatorClient, ActuatorClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ActuatorClientConfig {
//!     server_addr: "127.0.0.1:4567".parse()?,
//!     timeout: Duration::from_millis(3000),
//! };
//!
//! let mut client = ActuatorClient::new(config);
//! client.connect().await?;
//!
//! let command = client.recv().await?;
//! println!("Move {} to {}", command.channel, command.position);
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Timeout Handling
//!
//! Connect and send use the configured timeout. `recv` uses it as well;
//! `recv_forever` waits without a deadline for long-running emulators.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use combolock_core::constants::{DEFAULT_ACTUATOR_PORT, DEFAULT_CLIENT_TIMEOUT_MS};
use combolock_protocol::{ActuatorCommand, ServoCodec};

/// Configuration for the actuator client
#[derive(Debug, Clone)]
pub struct ActuatorClientConfig {
    /// Server address to connect to
    pub server_addr: SocketAddr,

    /// Timeout for connect, send and recv
    pub timeout: Duration,
}

impl Default for ActuatorClientConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_ACTUATOR_PORT)),
            timeout: Duration::from_millis(DEFAULT_CLIENT_TIMEOUT_MS),
        }
    }
}

/// Errors that can occur during actuator client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client is not connected to server
    #[error("Not connected to server")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Frame-level error from ServoCodec
    #[error("Protocol error: {0}")]
    Protocol(#[from] combolock_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Actuator-side TCP client
///
/// # Connection Lifecycle
///
/// 1. Create client with `new()`
/// 2. Connect to server with `connect()`
/// 3. Read commands with `recv()`
/// 4. Close connection with `close()`
pub struct ActuatorClient {
    /// Server address to connect to
    server_addr: SocketAddr,

    /// Framed TCP stream (None if not connected)
    framed: Option<Framed<TcpStream, ServoCodec>>,

    /// Timeout for I/O operations
    timeout: Duration,
}

impl ActuatorClient {
    /// Create a new client. It is not connected until `connect()` is called.
    pub fn new(config: ActuatorClientConfig) -> Self {
        debug!("Creating actuator client for server {}", config.server_addr);

        Self {
            server_addr: config.server_addr,
            framed: None,
            timeout: config.timeout,
        }
    }

    /// Connect to the controller's actuator server
    ///
    /// # Errors
    ///
    /// Returns an error if the connection times out or is refused.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        info!("Connecting to actuator server at {}", self.server_addr);

        let stream =
            match tokio::time::timeout(self.timeout, TcpStream::connect(self.server_addr)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    error!("Connection failed: {}", e);
                    return Err(e.into());
                }
                Err(_) => {
                    warn!("Connection timeout after {}ms", self.timeout.as_millis());
                    return Err(ClientError::ConnectionTimeout(self.timeout_ms()));
                }
            };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.framed = Some(Framed::new(stream, ServoCodec::new()));
        info!("Connected to actuator server at {}", self.server_addr);
        Ok(())
    }

    /// Receive the next command, failing after the configured timeout
    ///
    /// # Errors
    ///
    /// Returns an error if not connected, the read times out, the server
    /// closes the connection, or the stream fails.
    pub async fn recv(&mut self) -> Result<ActuatorCommand, ClientError> {
        let timeout = self.timeout;
        let timeout_ms = self.timeout_ms();
        let framed = self.framed.as_mut().ok_or(ClientError::NotConnected)?;

        match tokio::time::timeout(timeout, framed.next()).await {
            Ok(next) => Self::unwrap_frame(next),
            Err(_) => {
                warn!("Receive timeout after {}ms", timeout_ms);
                Err(ClientError::ReadTimeout(timeout_ms))
            }
        }
    }

    /// Receive the next command with no deadline
    pub async fn recv_forever(&mut self) -> Result<ActuatorCommand, ClientError> {
        let framed = self.framed.as_mut().ok_or(ClientError::NotConnected)?;
        Self::unwrap_frame(framed.next().await)
    }

    /// Send a frame back to the controller.
    ///
    /// The controller ignores inbound frames; this exists so tests can check
    /// that it does.
    pub async fn send(&mut self, command: ActuatorCommand) -> Result<(), ClientError> {
        let timeout = self.timeout;
        let timeout_ms = self.timeout_ms();
        let framed = self.framed.as_mut().ok_or(ClientError::NotConnected)?;

        match tokio::time::timeout(timeout, framed.send(command)).await {
            Ok(result) => result.map_err(ClientError::Protocol),
            Err(_) => Err(ClientError::WriteTimeout(timeout_ms)),
        }
    }

    /// Check if client is connected to server
    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Close the connection. Idempotent.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        if let Some(framed) = self.framed.take() {
            let mut stream = framed.into_inner();
            stream.shutdown().await?;
            info!("Disconnected from actuator server at {}", self.server_addr);
        }
        Ok(())
    }

    fn unwrap_frame(
        next: Option<Result<ActuatorCommand, combolock_core::Error>>,
    ) -> Result<ActuatorCommand, ClientError> {
        match next {
            Some(Ok(command)) => {
                trace!(%command, "Received actuator command");
                Ok(command)
            }
            Some(Err(e)) => {
                error!("Failed to decode frame: {}", e);
                Err(ClientError::Protocol(e))
            }
            None => {
                warn!("Connection closed by server");
                Err(ClientError::ConnectionLost(
                    "Server closed connection".to_string(),
                ))
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}
