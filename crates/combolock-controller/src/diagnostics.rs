//! Where transmission failures go.
//!
//! A failed send never reaches the caller of the controller. It is handed
//! to a [`DiagnosticSink`] instead, which can log it, keep it for display,
//! or both.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::warn;

use combolock_network::TransportError;
use combolock_protocol::ActuatorCommand;

/// A command the transport refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionFailure {
    pub command: ActuatorCommand,
    pub error: TransportError,
    pub at: DateTime<Utc>,
}

impl TransmissionFailure {
    pub fn new(command: ActuatorCommand, error: TransportError) -> Self {
        Self {
            command,
            error,
            at: Utc::now(),
        }
    }
}

/// Receiver of transmission failures.
///
/// Takes `&self` so one sink can be shared between the controller and
/// whatever displays the failures.
pub trait DiagnosticSink {
    fn report(&self, failure: TransmissionFailure);
}

impl<D: DiagnosticSink + ?Sized> DiagnosticSink for &D {
    fn report(&self, failure: TransmissionFailure) {
        (**self).report(failure)
    }
}

impl<D: DiagnosticSink + ?Sized> DiagnosticSink for Arc<D> {
    fn report(&self, failure: TransmissionFailure) {
        (**self).report(failure)
    }
}

/// Logs each failure at warn level and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, failure: TransmissionFailure) {
        warn!(
            command = %failure.command,
            error = %failure.error,
            "Actuator command not delivered"
        );
    }
}

/// Logs each failure and keeps it for later inspection.
///
/// Clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    failures: Arc<Mutex<Vec<TransmissionFailure>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every failure reported so far, oldest first.
    pub fn failures(&self) -> Vec<TransmissionFailure> {
        self.lock().clone()
    }

    pub fn last_failure(&self) -> Option<TransmissionFailure> {
        self.lock().last().cloned()
    }

    pub fn failure_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TransmissionFailure>> {
        // A panic while pushing cannot leave the Vec inconsistent
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, failure: TransmissionFailure) {
        TracingDiagnostics.report(failure.clone());
        self.lock().push(failure);
    }
}
