//! Command encoder and transmitter.

use tracing::{debug, trace};

use combolock_network::Transport;
use combolock_protocol::ActuatorCommand;

use crate::diagnostics::{DiagnosticSink, TracingDiagnostics, TransmissionFailure};

/// Encodes actuator commands into two-byte frames and hands them to a
/// transport.
///
/// Each command is attempted once. A failure goes to the diagnostic sink
/// and is not returned as an error.
#[derive(Debug, Clone)]
pub struct CommandTransmitter<T, D = TracingDiagnostics> {
    transport: T,
    diagnostics: D,
}

impl<T: Transport> CommandTransmitter<T, TracingDiagnostics> {
    /// Transmitter that only logs failures.
    pub fn with_tracing(transport: T) -> Self {
        Self::new(transport, TracingDiagnostics)
    }
}

impl<T: Transport, D: DiagnosticSink> CommandTransmitter<T, D> {
    pub fn new(transport: T, diagnostics: D) -> Self {
        Self {
            transport,
            diagnostics,
        }
    }

    /// Send `position` to servo `channel`.
    ///
    /// Returns whether the transport accepted the frame.
    pub fn send(&self, channel: u8, position: u8) -> bool {
        self.send_command(ActuatorCommand::new(channel, position))
    }

    /// Send an already built command. Same semantics as [`send`](Self::send).
    pub fn send_command(&self, command: ActuatorCommand) -> bool {
        let frame = command.to_bytes();

        match self.transport.try_send(&frame) {
            Ok(()) => {
                trace!(%command, ?frame, "Actuator frame handed to transport");
                true
            }
            Err(error) => {
                debug!(%command, %error, "Transport refused actuator frame");
                self.diagnostics
                    .report(TransmissionFailure::new(command, error));
                false
            }
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }
}
