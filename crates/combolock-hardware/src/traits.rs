//! Selector notification types and the panel trait.
//!
//! The trait uses native `async fn` (Edition 2024 RPITIT), so it is not
//! object-safe. Use it through generic parameters.

#![allow(async_fn_in_trait)]

use std::fmt;

use serde::{Deserialize, Serialize};

use combolock_core::{Digit, SelectorIndex};

use crate::error::Result;

/// One notification from the selector panel.
///
/// Gestures are episode-scoped: exactly one `InteractionStarted` precedes any
/// number of `ValueChanged` events from that gesture, followed by exactly one
/// `InteractionFinished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SelectorEvent {
    /// A selector now shows `value`.
    ValueChanged { index: SelectorIndex, value: Digit },

    /// The user started dragging or scrolling a selector.
    InteractionStarted { index: SelectorIndex },

    /// The gesture on a selector ended.
    InteractionFinished { index: SelectorIndex },

    /// The UI zeroed every selector and asks the controller to follow.
    ResetRequested,
}

impl SelectorEvent {
    /// Selector the event came from, if it concerns a single one.
    pub fn index(&self) -> Option<SelectorIndex> {
        match self {
            Self::ValueChanged { index, .. }
            | Self::InteractionStarted { index }
            | Self::InteractionFinished { index } => Some(*index),
            Self::ResetRequested => None,
        }
    }
}

impl fmt::Display for SelectorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueChanged { index, value } => write!(f, "selector {index} = {value}"),
            Self::InteractionStarted { index } => write!(f, "selector {index} gesture started"),
            Self::InteractionFinished { index } => write!(f, "selector {index} gesture finished"),
            Self::ResetRequested => write!(f, "reset requested"),
        }
    }
}

/// Source of selector notifications.
///
/// # Examples
///
/// ```no_run
/// use combolock_hardware::{Result, SelectorEvent, SelectorPanel};
///
/// async fn count_changes<P: SelectorPanel>(panel: &mut P, limit: usize) -> Result<usize> {
///     let mut changes = 0;
///     for _ in 0..limit {
///         if let SelectorEvent::ValueChanged { .. } = panel.next_event().await? {
///             changes += 1;
///         }
///     }
///     Ok(changes)
/// }
/// ```
pub trait SelectorPanel: Send {
    /// Wait for the next notification.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` once the panel can produce no
    /// more events.
    async fn next_event(&mut self) -> Result<SelectorEvent>;
}
