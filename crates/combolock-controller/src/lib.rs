//! Lock controller for the four-selector combination lock.
//!
//! The controller records the selector values reported by the UI, decides
//! whether they match the combination, and drives the servo through a
//! [`CommandTransmitter`]. Commands are edge-triggered: one is sent only when
//! the decision differs from the believed lock state.
//!
//! # Examples
//!
//! ```
//! use combolock_controller::{CommandTransmitter, LockController, RecordingDiagnostics};
//! use combolock_core::{Digit, LockConfig, LockState, SelectorIndex};
//! use combolock_network::{Transport, TransportError};
//!
//! struct Sink;
//!
//! impl Transport for Sink {
//!     fn try_send(&self, _frame: &[u8]) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! let transmitter = CommandTransmitter::new(Sink, RecordingDiagnostics::new());
//! let mut controller = LockController::new(LockConfig::default(), transmitter).unwrap();
//!
//! for (i, v) in [1, 2, 3, 4].into_iter().enumerate() {
//!     controller.on_selector_changed(SelectorIndex::new(i).unwrap(), Digit::new(v).unwrap());
//! }
//!
//! assert_eq!(controller.current_lock_state(), LockState::Unlocked);
//! ```

pub mod controller;
pub mod diagnostics;
pub mod shared;
pub mod transmitter;

pub use controller::{LockController, LockStatus, LockTransition, MAX_HISTORY_SIZE};
pub use diagnostics::{
    DiagnosticSink, RecordingDiagnostics, TracingDiagnostics, TransmissionFailure,
};
pub use shared::SharedLockController;
pub use transmitter::CommandTransmitter;
