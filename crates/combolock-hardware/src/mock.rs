//! Mock selector panel for testing and headless hosts.
//!
//! The panel receives its notifications through an internal channel. A
//! cloneable [`MockSelectorHandle`] plays the role of the UI: it keeps the
//! widget values and emits the same notification sequences a real lock face
//! would.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use combolock_core::{Digit, SelectorIndex, SelectorValues, constants::SELECTOR_COUNT};

use crate::{
    HardwareError, Result,
    traits::{SelectorEvent, SelectorPanel},
};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Mock selector panel.
///
/// # Examples
///
/// ```
/// use combolock_hardware::mock::MockSelectorPanel;
/// use combolock_hardware::{SelectorEvent, SelectorPanel};
///
/// #[tokio::main]
/// async fn main() -> combolock_hardware::Result<()> {
///     let (mut panel, handle) = MockSelectorPanel::new();
///
///     tokio::spawn(async move {
///         handle.spin(0, &[1]).await.unwrap();
///     });
///
///     assert!(matches!(
///         panel.next_event().await?,
///         SelectorEvent::InteractionStarted { .. }
///     ));
///     assert!(matches!(
///         panel.next_event().await?,
///         SelectorEvent::ValueChanged { .. }
///     ));
///     assert!(matches!(
///         panel.next_event().await?,
///         SelectorEvent::InteractionFinished { .. }
///     ));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSelectorPanel {
    /// Channel receiver for simulated notifications
    event_rx: mpsc::Receiver<SelectorEvent>,
}

impl MockSelectorPanel {
    /// Create a panel whose selectors all show zero.
    pub fn new() -> (Self, MockSelectorHandle) {
        Self::with_initial_values([Digit::ZERO; SELECTOR_COUNT])
    }

    /// Create a panel whose selectors start at `values`.
    ///
    /// No notification is emitted for the initial values.
    pub fn with_initial_values(values: SelectorValues) -> (Self, MockSelectorHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (values_tx, _) = watch::channel(values);

        let panel = Self { event_rx };
        let handle = MockSelectorHandle {
            event_tx,
            values: Arc::new(values_tx),
        };

        (panel, handle)
    }
}

impl SelectorPanel for MockSelectorPanel {
    async fn next_event(&mut self) -> Result<SelectorEvent> {
        self.event_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("Selector event channel closed"))
    }
}

/// Handle for driving a mock selector panel.
///
/// Clones share the same widget values and event channel.
#[derive(Debug, Clone)]
pub struct MockSelectorHandle {
    event_tx: mpsc::Sender<SelectorEvent>,
    values: Arc<watch::Sender<SelectorValues>>,
}

impl MockSelectorHandle {
    /// Set one selector to `value`, as a tap on the widget would.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or value is out of range, or if the
    /// panel has been dropped.
    pub async fn set(&self, index: usize, value: u8) -> Result<()> {
        let index = SelectorIndex::new(index)?;
        let value = Digit::new(value)?;
        self.change(index, value).await
    }

    /// Simulate a drag gesture that passes through `values` in order.
    ///
    /// Emits one `InteractionStarted`, a `ValueChanged` per value, then one
    /// `InteractionFinished`. The whole sequence is validated before anything
    /// is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or any value is out of range, or if the
    /// panel has been dropped.
    pub async fn spin(&self, index: usize, values: &[u8]) -> Result<()> {
        let index = SelectorIndex::new(index)?;
        let values = values
            .iter()
            .map(|&v| Digit::new(v))
            .collect::<combolock_core::Result<Vec<_>>>()?;

        self.begin(index).await?;
        for value in values {
            self.change(index, value).await?;
        }
        self.finish(index).await
    }

    /// Start a gesture on `index` without ending it.
    pub async fn begin(&self, index: SelectorIndex) -> Result<()> {
        self.send(SelectorEvent::InteractionStarted { index }).await
    }

    /// End a gesture on `index`.
    pub async fn finish(&self, index: SelectorIndex) -> Result<()> {
        self.send(SelectorEvent::InteractionFinished { index }).await
    }

    /// Zero every selector and ask the controller to follow.
    ///
    /// The widgets are zeroed without per-selector notifications; only a
    /// single `ResetRequested` is emitted.
    pub async fn reset(&self) -> Result<()> {
        self.values
            .send_modify(|values| *values = [Digit::ZERO; SELECTOR_COUNT]);
        self.send(SelectorEvent::ResetRequested).await
    }

    /// Values the widgets currently show.
    pub fn values(&self) -> SelectorValues {
        *self.values.borrow()
    }

    async fn change(&self, index: SelectorIndex, value: Digit) -> Result<()> {
        self.values
            .send_modify(|values| values[index.as_usize()] = value);
        self.send(SelectorEvent::ValueChanged { index, value }).await
    }

    async fn send(&self, event: SelectorEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("Selector event channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(i: usize) -> SelectorIndex {
        SelectorIndex::new(i).unwrap()
    }

    fn digit(v: u8) -> Digit {
        Digit::new(v).unwrap()
    }

    #[tokio::test]
    async fn test_set_emits_value_changed() {
        let (mut panel, handle) = MockSelectorPanel::new();

        handle.set(2, 7).await.unwrap();

        assert_eq!(
            panel.next_event().await.unwrap(),
            SelectorEvent::ValueChanged {
                index: index(2),
                value: digit(7)
            }
        );
        assert_eq!(handle.values()[2], digit(7));
    }

    #[tokio::test]
    async fn test_spin_is_bracketed_by_gesture_events() {
        let (mut panel, handle) = MockSelectorPanel::new();

        handle.spin(1, &[3, 4, 5]).await.unwrap();

        let mut events = Vec::new();
        for _ in 0..5 {
            events.push(panel.next_event().await.unwrap());
        }

        assert_eq!(events[0], SelectorEvent::InteractionStarted { index: index(1) });
        assert_eq!(
            events[1..4]
                .iter()
                .filter(|e| matches!(e, SelectorEvent::ValueChanged { .. }))
                .count(),
            3
        );
        assert_eq!(events[4], SelectorEvent::InteractionFinished { index: index(1) });
        assert_eq!(handle.values()[1], digit(5));
    }

    #[tokio::test]
    async fn test_spin_validates_before_sending() {
        let (mut panel, handle) = MockSelectorPanel::new();

        assert!(handle.spin(0, &[1, 12]).await.is_err());

        drop(handle);
        assert!(panel.next_event().await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_index_rejected() {
        let (_panel, handle) = MockSelectorPanel::new();

        let result = handle.set(4, 1).await;
        assert!(matches!(result, Err(HardwareError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_reset_zeroes_silently() {
        let initial = [digit(1), digit(2), digit(3), digit(4)];
        let (mut panel, handle) = MockSelectorPanel::with_initial_values(initial);
        assert_eq!(handle.values(), initial);

        handle.reset().await.unwrap();

        assert_eq!(handle.values(), [Digit::ZERO; SELECTOR_COUNT]);
        assert_eq!(
            panel.next_event().await.unwrap(),
            SelectorEvent::ResetRequested
        );
    }

    #[tokio::test]
    async fn test_clones_share_values() {
        let (_panel, handle) = MockSelectorPanel::new();
        let other = handle.clone();

        handle.set(3, 9).await.unwrap();

        assert_eq!(other.values()[3], digit(9));
    }

    #[tokio::test]
    async fn test_panel_dropped() {
        let (panel, handle) = MockSelectorPanel::new();
        drop(panel);

        let result = handle.set(0, 1).await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_handle_dropped() {
        let (mut panel, handle) = MockSelectorPanel::new();
        drop(handle);

        assert!(panel.next_event().await.is_err());
    }
}
