//! Actuator command value type.
//!
//! # Frame Layout
//!
//! | Offset | Field | Meaning |
//! |--------|-------|---------|
//! | 0 | channel | Servo port on the actuator board |
//! | 1 | position | Target angle, 0-180 |
//!
//! There is no framing, checksum or version byte. The stream underneath is
//! already reliable, so a frame is exactly its two payload bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use combolock_core::{
    Error, LockConfig, LockState, Result,
    constants::{FRAME_SIZE, MAX_SERVO_POSITION},
};

/// A single servo command.
///
/// Commands are ephemeral: built, encoded and dropped on every transmission.
///
/// # Examples
///
/// ```
/// use combolock_core::{LockConfig, LockState};
/// use combolock_protocol::ActuatorCommand;
///
/// let config = LockConfig::default();
/// let unlock = ActuatorCommand::for_state(&config, LockState::Unlocked);
/// assert_eq!(unlock.to_bytes(), [5, 175]);
///
/// let decoded = ActuatorCommand::from_bytes(&[5, 5]).unwrap();
/// assert_eq!(decoded, ActuatorCommand::for_state(&config, LockState::Locked));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// Servo channel being addressed.
    pub channel: u8,

    /// Target servo position.
    pub position: u8,
}

impl ActuatorCommand {
    pub fn new(channel: u8, position: u8) -> Self {
        Self { channel, position }
    }

    /// Command that drives the configured lock servo into `state`.
    pub fn for_state(config: &LockConfig, state: LockState) -> Self {
        Self::new(config.servo_channel, config.position_for(state))
    }

    /// Encode into the two-byte wire frame.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        [self.channel, self.position]
    }

    /// Decode a frame.
    ///
    /// # Errors
    /// Returns `Error::InvalidFrame` unless `bytes` is exactly
    /// [`FRAME_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [channel, position] => Ok(Self::new(*channel, *position)),
            _ => Err(Error::InvalidFrame {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            }),
        }
    }

    /// True if the position is an angle a servo can reach.
    #[must_use]
    pub fn is_position_in_range(&self) -> bool {
        self.position <= MAX_SERVO_POSITION
    }
}

impl From<ActuatorCommand> for [u8; FRAME_SIZE] {
    fn from(command: ActuatorCommand) -> Self {
        command.to_bytes()
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "servo {} -> {}", self.channel, self.position)
    }
}
