//! Thread-safe handle around a [`LockController`].
//!
//! One mutex guards the selector values, the gesture flag and the lock
//! state. Critical sections never wait on I/O because `Transport::try_send`
//! does not block.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use combolock_core::{Digit, LockState, SelectorIndex, SelectorValues};
use combolock_hardware::{HardwareError, SelectorEvent, SelectorPanel};
use combolock_network::Transport;

use crate::controller::{LockController, LockStatus, LockTransition};
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};

/// Cloneable, mutex-serialized lock controller.
pub struct SharedLockController<T, D = TracingDiagnostics> {
    inner: Arc<Mutex<LockController<T, D>>>,
}

impl<T, D> Clone for SharedLockController<T, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport, D: DiagnosticSink> SharedLockController<T, D> {
    pub fn new(controller: LockController<T, D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn handle_event(&self, event: SelectorEvent) -> Option<LockTransition> {
        self.lock().handle_event(event)
    }

    pub fn on_selector_changed(
        &self,
        index: SelectorIndex,
        value: Digit,
    ) -> Option<LockTransition> {
        self.lock().on_selector_changed(index, value)
    }

    pub fn on_interaction_started(&self) {
        self.lock().on_interaction_started()
    }

    pub fn on_interaction_finished(&self) -> Option<LockTransition> {
        self.lock().on_interaction_finished()
    }

    pub fn reset(&self) -> Option<LockTransition> {
        self.lock().reset()
    }

    pub fn reevaluate(&self) -> Option<LockTransition> {
        self.lock().reevaluate()
    }

    pub fn current_lock_state(&self) -> LockState {
        self.lock().current_lock_state()
    }

    pub fn status(&self) -> LockStatus {
        self.lock().status()
    }

    pub fn selector_values(&self) -> SelectorValues {
        *self.lock().selector_values()
    }

    /// Run `f` with exclusive access to the controller.
    pub fn with<R>(&self, f: impl FnOnce(&mut LockController<T, D>) -> R) -> R {
        f(&mut self.lock())
    }

    /// Feed every event from `panel` into the controller until the panel
    /// disconnects.
    ///
    /// # Errors
    ///
    /// Returns any panel error other than a disconnect.
    pub async fn drive<P: SelectorPanel>(&self, panel: &mut P) -> combolock_hardware::Result<()> {
        loop {
            let event = match panel.next_event().await {
                Ok(event) => event,
                Err(HardwareError::Disconnected { device }) => {
                    info!(%device, "Selector panel disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            debug!(%event, "Selector event");
            self.handle_event(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, LockController<T, D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::transmitter::CommandTransmitter;
    use combolock_core::LockConfig;
    use combolock_network::TransportError;
    use std::thread;

    struct Accepting;

    impl Transport for Accepting {
        fn try_send(&self, _frame: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn shared() -> SharedLockController<Accepting, RecordingDiagnostics> {
        let transmitter = CommandTransmitter::new(Accepting, RecordingDiagnostics::new());
        SharedLockController::new(LockController::new(LockConfig::default(), transmitter).unwrap())
    }

    #[test]
    fn test_clones_share_controller() {
        let controller = shared();
        let other = controller.clone();

        for (i, v) in [1, 2, 3, 4].into_iter().enumerate() {
            controller.on_selector_changed(SelectorIndex::new(i).unwrap(), Digit::new(v).unwrap());
        }

        assert_eq!(other.current_lock_state(), LockState::Unlocked);
        assert_eq!(other.status().to_string(), "Unlocked!");
    }

    #[test]
    fn test_notifications_from_many_threads() {
        let controller = shared();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let controller = controller.clone();
                thread::spawn(move || {
                    controller.on_selector_changed(
                        SelectorIndex::new(i).unwrap(),
                        Digit::new(i as u8 + 1).unwrap(),
                    );
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(controller.current_lock_state(), LockState::Unlocked);
        assert_eq!(controller.with(|c| c.history().len()), 1);
    }
}
