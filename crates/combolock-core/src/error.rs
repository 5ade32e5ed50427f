use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid digit: {0} (must be 0-9)")]
    InvalidDigit(u8),

    #[error("Invalid selector index: {0} (must be 0-3)")]
    InvalidSelectorIndex(usize),

    #[error("Invalid combination configuration: expected {expected} digits, got {actual}")]
    InvalidCombinationConfiguration { expected: usize, actual: usize },

    #[error("Invalid servo position: {0} (must be 0-180)")]
    InvalidServoPosition(u8),

    #[error("Invalid actuator frame: expected {expected} bytes, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
