//! The transport seam used by the command transmitter.
//!
//! A [`Transport`] accepts one encoded frame and either takes responsibility
//! for delivering it or reports why it cannot. Implementations must not
//! block: the lock controller calls `try_send` from inside its evaluation
//! step and moves on.

use std::sync::Arc;

use thiserror::Error;

/// Errors a transport can report for a single frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No actuator peer is connected to receive the frame.
    #[error("No actuator peer connected")]
    NoPeer,

    /// Frame has the wrong size for the actuator wire format.
    #[error("Invalid frame: expected {expected} bytes, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    /// The underlying connection failed while writing.
    ///
    /// Only transports that write synchronously inside `try_send` report
    /// this. [`ActuatorHandle`](crate::ActuatorHandle) hands frames to peer
    /// tasks, which log their own write failures, so it never returns it.
    #[error("Write failed: {0}")]
    Write(String),
}

/// Send-or-fail primitive for actuator frames.
///
/// # Example
///
/// ```
/// use combolock_network::{Transport, TransportError};
///
/// struct Disconnected;
///
/// impl Transport for Disconnected {
///     fn try_send(&self, _frame: &[u8]) -> Result<(), TransportError> {
///         Err(TransportError::NoPeer)
///     }
/// }
///
/// assert_eq!(Disconnected.try_send(&[5, 175]), Err(TransportError::NoPeer));
/// ```
pub trait Transport {
    /// Hand one frame to the transport.
    ///
    /// `Ok(())` means the frame was accepted for delivery, not that the
    /// actuator acted on it.
    fn try_send(&self, frame: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn try_send(&self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).try_send(frame)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn try_send(&self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).try_send(frame)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn try_send(&self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).try_send(frame)
    }
}
