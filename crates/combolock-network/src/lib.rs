//! Network layer between the lock controller and the actuator bridge.
//!
//! The actuator board (a microcontroller driving the lock servo) connects
//! to the controller over TCP and receives raw two-byte command frames.
//!
//! # Components
//!
//! - **Transport**: the send-or-fail seam the controller's transmitter uses
//! - **ActuatorServer**: listens for actuator bridge connections and writes
//!   every queued command to each connected peer
//! - **ActuatorHandle**: cheap, cloneable, non-blocking [`Transport`] into a
//!   running server
//! - **ActuatorClient** / **ServoEmulator**: the actuator side, used by tests
//!   and for running without hardware
//!
//! # Example
//!
//! ```no_run
//! use combolock_network::{ActuatorServer, ActuatorServerConfig, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = ActuatorServer::bind(ActuatorServerConfig::default()).await?;
//! let handle = server.handle();
//! tokio::spawn(server.run());
//!
//! // Fails with TransportError::NoPeer until the bridge connects
//! let _ = handle.try_send(&[5, 175]);
//! # Ok(())
//! # }
//! ```

mod client;
mod emulator;
mod server;
mod transport;

pub use client::{ActuatorClient, ActuatorClientConfig, ClientError};
pub use emulator::ServoEmulator;
pub use server::{ActuatorHandle, ActuatorServer, ActuatorServerConfig, PeerId, ServerError};
pub use transport::{Transport, TransportError};
