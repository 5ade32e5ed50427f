//! Lock configuration.
//!
//! [`LockConfig`] groups the secret combination, the servo channel and the
//! two servo positions. Production code uses [`LockConfig::default`], which
//! is built from the compiled-in constants; tests substitute their own values
//! through the builder methods.
//!
//! # Example
//!
//! ```
//! use combolock_core::{Combination, LockConfig, LockState};
//!
//! let config = LockConfig::default()
//!     .with_combination(Combination::from_digits(&[9, 0, 0, 1]).unwrap())
//!     .with_positions(10, 170);
//!
//! config.validate().unwrap();
//! assert_eq!(config.position_for(LockState::Unlocked), 170);
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    Combination, LockState, Result,
    constants::{LOCKED_POSITION, MAX_SERVO_POSITION, SERVO_CHANNEL, UNLOCKED_POSITION},
    error::Error,
};

/// Named constants the lock controller is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Secret combination.
    pub combination: Combination,

    /// Servo channel addressed by lock commands.
    pub servo_channel: u8,

    /// Servo position that engages the lock.
    pub locked_position: u8,

    /// Servo position that disengages the lock.
    pub unlocked_position: u8,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            combination: Combination::default(),
            servo_channel: SERVO_CHANNEL,
            locked_position: LOCKED_POSITION,
            unlocked_position: UNLOCKED_POSITION,
        }
    }
}

impl LockConfig {
    pub fn with_combination(mut self, combination: Combination) -> Self {
        self.combination = combination;
        self
    }

    pub fn with_servo_channel(mut self, channel: u8) -> Self {
        self.servo_channel = channel;
        self
    }

    pub fn with_positions(mut self, locked: u8, unlocked: u8) -> Self {
        self.locked_position = locked;
        self.unlocked_position = unlocked;
        self
    }

    /// Check the configuration before a controller is started with it.
    ///
    /// # Errors
    /// Returns `Error::InvalidServoPosition` if either position exceeds
    /// [`MAX_SERVO_POSITION`], or `Error::Config` if both positions are equal
    /// (the lock could never move).
    pub fn validate(&self) -> Result<()> {
        for position in [self.locked_position, self.unlocked_position] {
            if position > MAX_SERVO_POSITION {
                return Err(Error::InvalidServoPosition(position));
            }
        }

        if self.locked_position == self.unlocked_position {
            return Err(Error::Config(format!(
                "Locked and unlocked positions are both {}",
                self.locked_position
            )));
        }

        Ok(())
    }

    /// Servo position that puts the lock into `state`.
    #[must_use]
    pub fn position_for(&self, state: LockState) -> u8 {
        match state {
            LockState::Locked => self.locked_position,
            LockState::Unlocked => self.unlocked_position,
        }
    }
}
