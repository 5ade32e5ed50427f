//! Error types for selector panel operations.

/// Result type alias for selector panel operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while reading or driving a selector panel.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The panel's notification channel is gone.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// A value or index outside the selector's range.
    #[error("Invalid data: {0}")]
    InvalidData(#[from] combolock_core::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }
}
