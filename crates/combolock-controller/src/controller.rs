//! Lock controller state machine.
//!
//! # States
//!
//! - `Locked` (initial): the servo was last commanded to the locked position
//! - `Unlocked`: the servo was last commanded to the unlocked position
//!
//! # Transitions
//!
//! - Locked → Unlocked when the recorded values match the combination
//! - Unlocked → Locked when they stop matching
//!
//! Evaluation is suppressed while a gesture is in progress and runs exactly
//! once when it ends. An evaluation whose outcome equals the current state
//! sends nothing.
//!
//! # Believed state
//!
//! The state changes when a command is issued, before the transport reports
//! anything, and is never rolled back. There is no feedback channel from the
//! actuator, so [`LockController::current_lock_state`] is what the controller
//! last asked for, not a measurement.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use combolock_core::{
    Digit, LockConfig, LockState, Result, SelectorIndex, SelectorValues,
    constants::{SELECTOR_COUNT, STATUS_INVALID_PIN, STATUS_UNLOCKED},
};
use combolock_hardware::SelectorEvent;
use combolock_network::Transport;
use combolock_protocol::ActuatorCommand;

use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::transmitter::CommandTransmitter;

/// Maximum number of lock transitions kept in history.
pub const MAX_HISTORY_SIZE: usize = 64;

/// A change of the believed lock state and the command that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockTransition {
    pub from: LockState,
    pub to: LockState,
    pub command: ActuatorCommand,
    /// Whether the transport accepted the command.
    pub delivered: bool,
    pub at: DateTime<Utc>,
}

/// What the lock face should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub state: LockState,
    /// Outcome of the most recent evaluation.
    pub combination_matched: bool,
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.combination_matched {
            f.write_str(STATUS_UNLOCKED)
        } else {
            f.write_str(STATUS_INVALID_PIN)
        }
    }
}

/// Combination lock controller.
///
/// Not thread-safe. Wrap in [`SharedLockController`](crate::SharedLockController)
/// when notifications arrive from more than one thread.
///
/// # Examples
///
/// ```
/// use combolock_controller::{CommandTransmitter, LockController};
/// use combolock_core::{Digit, LockConfig, LockState, SelectorIndex};
/// use combolock_network::{Transport, TransportError};
///
/// struct Offline;
///
/// impl Transport for Offline {
///     fn try_send(&self, _frame: &[u8]) -> Result<(), TransportError> {
///         Err(TransportError::NoPeer)
///     }
/// }
///
/// let mut controller =
///     LockController::new(LockConfig::default(), CommandTransmitter::with_tracing(Offline))
///         .unwrap();
/// let first = SelectorIndex::new(0).unwrap();
///
/// controller.on_interaction_started();
/// for v in [1, 4, 9] {
///     controller.on_selector_changed(first, Digit::new(v).unwrap());
/// }
/// assert!(controller.history().is_empty());
///
/// controller.on_interaction_finished();
/// assert_eq!(controller.current_lock_state(), LockState::Locked);
/// ```
#[derive(Debug)]
pub struct LockController<T, D = TracingDiagnostics> {
    config: LockConfig,
    transmitter: CommandTransmitter<T, D>,
    values: SelectorValues,
    interacting: bool,
    state: LockState,
    combination_matched: bool,
    history: VecDeque<LockTransition>,
}

impl<T: Transport, D: DiagnosticSink> LockController<T, D> {
    /// Create a controller in the `Locked` state with every recorded value
    /// at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid. The controller does not
    /// start in that case.
    pub fn new(config: LockConfig, transmitter: CommandTransmitter<T, D>) -> Result<Self> {
        config.validate()?;

        debug!(
            channel = config.servo_channel,
            locked = config.locked_position,
            unlocked = config.unlocked_position,
            "Lock controller created"
        );

        Ok(Self {
            config,
            transmitter,
            values: [Digit::ZERO; SELECTOR_COUNT],
            interacting: false,
            state: LockState::Locked,
            combination_matched: false,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        })
    }

    /// Seed the recorded values from what the widgets show at startup.
    ///
    /// Nothing is evaluated. Call [`reevaluate`](Self::reevaluate) to act on
    /// the seeded values.
    pub fn with_initial_values(mut self, values: SelectorValues) -> Self {
        self.values = values;
        self
    }

    /// Record a new value for one selector.
    ///
    /// Evaluates immediately unless a gesture is in progress.
    pub fn on_selector_changed(
        &mut self,
        index: SelectorIndex,
        value: Digit,
    ) -> Option<LockTransition> {
        self.values[index.as_usize()] = value;
        trace!(%index, %value, interacting = self.interacting, "Selector changed");

        if self.interacting {
            return None;
        }
        self.evaluate()
    }

    /// A gesture started. Idempotent.
    pub fn on_interaction_started(&mut self) {
        self.interacting = true;
    }

    /// A gesture ended. Evaluates exactly once.
    pub fn on_interaction_finished(&mut self) -> Option<LockTransition> {
        self.interacting = false;
        self.evaluate()
    }

    /// Zero every recorded value and evaluate.
    ///
    /// The widgets themselves are zeroed by the UI. During a gesture the
    /// evaluation waits for [`on_interaction_finished`](Self::on_interaction_finished),
    /// like any other change.
    pub fn reset(&mut self) -> Option<LockTransition> {
        self.values = [Digit::ZERO; SELECTOR_COUNT];
        debug!("Selectors reset");

        if self.interacting {
            return None;
        }
        self.evaluate()
    }

    /// Evaluate the current values outside of any notification, for example
    /// once at startup. Does nothing during a gesture.
    pub fn reevaluate(&mut self) -> Option<LockTransition> {
        if self.interacting {
            return None;
        }
        self.evaluate()
    }

    /// Dispatch one selector notification.
    pub fn handle_event(&mut self, event: SelectorEvent) -> Option<LockTransition> {
        match event {
            SelectorEvent::ValueChanged { index, value } => self.on_selector_changed(index, value),
            SelectorEvent::InteractionStarted { .. } => {
                self.on_interaction_started();
                None
            }
            SelectorEvent::InteractionFinished { .. } => self.on_interaction_finished(),
            SelectorEvent::ResetRequested => self.reset(),
        }
    }

    /// Believed lock state: the last state the controller commanded.
    ///
    /// Not verified against the actuator. A command that failed to deliver
    /// still moved this state.
    pub fn current_lock_state(&self) -> LockState {
        self.state
    }

    pub fn status(&self) -> LockStatus {
        LockStatus {
            state: self.state,
            combination_matched: self.combination_matched,
        }
    }

    pub fn selector_values(&self) -> &SelectorValues {
        &self.values
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn transmitter(&self) -> &CommandTransmitter<T, D> {
        &self.transmitter
    }

    /// Transitions so far, oldest first, at most [`MAX_HISTORY_SIZE`].
    pub fn history(&self) -> &VecDeque<LockTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<LockTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    fn evaluate(&mut self) -> Option<LockTransition> {
        let matched = self.config.combination.matches(&self.values);
        self.combination_matched = matched;

        let target = if matched {
            LockState::Unlocked
        } else {
            LockState::Locked
        };
        if target == self.state {
            trace!(state = %self.state, "Evaluation left lock state unchanged");
            return None;
        }

        let from = self.state;
        let command = ActuatorCommand::for_state(&self.config, target);
        self.state = target;
        let delivered = self.transmitter.send_command(command);

        info!(%from, to = %target, %command, delivered, "Lock state changed");

        let transition = LockTransition {
            from,
            to: target,
            command,
            delivered,
            at: Utc::now(),
        };
        self.add_to_history(transition.clone());
        Some(transition)
    }

    fn add_to_history(&mut self, transition: LockTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}
