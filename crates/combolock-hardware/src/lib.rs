//! Digit-selector abstraction for the combination lock.
//!
//! The four selectors on the lock face are owned by the UI layer. The core
//! only sees them through the notifications they emit:
//!
//! - a value change on one selector,
//! - the start of a gesture (the user begins dragging or scrolling),
//! - the end of that gesture,
//! - a reset request (the UI zeroed every selector).
//!
//! [`SelectorPanel`] is the async source of those notifications, and
//! [`mock::MockSelectorPanel`] drives it programmatically for tests and for
//! hosts without a real UI.
//!
//! ```no_run
//! use combolock_hardware::{SelectorEvent, SelectorPanel};
//! use combolock_hardware::mock::MockSelectorPanel;
//!
//! # async fn example() -> combolock_hardware::Result<()> {
//! let (mut panel, handle) = MockSelectorPanel::new();
//! handle.set(0, 1).await?;
//!
//! match panel.next_event().await? {
//!     SelectorEvent::ValueChanged { index, value } => println!("{index} -> {value}"),
//!     other => println!("{other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mock;
pub mod traits;

pub use error::{HardwareError, Result};
pub use traits::{SelectorEvent, SelectorPanel};
