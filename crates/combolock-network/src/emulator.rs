//! Software stand-in for the servo board.

use std::collections::HashMap;

use tracing::{info, warn};

use combolock_core::{LockConfig, LockState};
use combolock_protocol::ActuatorCommand;

use crate::client::{ActuatorClient, ClientError};

/// Tracks the last position commanded on each servo channel.
#[derive(Debug, Default, Clone)]
pub struct ServoEmulator {
    positions: HashMap<u8, u8>,
    applied: usize,
}

impl ServoEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command. Out-of-range positions are logged and ignored, as a
    /// real servo would clamp or stall.
    pub fn apply(&mut self, command: ActuatorCommand) {
        if !command.is_position_in_range() {
            warn!(%command, "Ignoring servo command outside 0-180");
            return;
        }
        self.positions.insert(command.channel, command.position);
        self.applied += 1;
    }

    /// Last position on `channel`, if it was ever commanded.
    pub fn position(&self, channel: u8) -> Option<u8> {
        self.positions.get(&channel).copied()
    }

    /// Number of commands applied so far.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Physical lock state implied by the lock servo's position.
    pub fn lock_state(&self, config: &LockConfig) -> Option<LockState> {
        match self.position(config.servo_channel)? {
            p if p == config.unlocked_position => Some(LockState::Unlocked),
            p if p == config.locked_position => Some(LockState::Locked),
            _ => None,
        }
    }

    /// Apply every command read from `client` until the connection ends.
    pub async fn run(
        &mut self,
        client: &mut ActuatorClient,
        config: &LockConfig,
    ) -> Result<(), ClientError> {
        loop {
            match client.recv_forever().await {
                Ok(command) => {
                    self.apply(command);
                    info!(
                        %command,
                        state = ?self.lock_state(config),
                        "Emulated servo moved"
                    );
                }
                Err(ClientError::ConnectionLost(_)) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_tracks_positions() {
        let config = LockConfig::default();
        let mut servo = ServoEmulator::new();
        assert_eq!(servo.lock_state(&config), None);

        servo.apply(ActuatorCommand::for_state(&config, LockState::Unlocked));
        assert_eq!(servo.position(5), Some(175));
        assert_eq!(servo.lock_state(&config), Some(LockState::Unlocked));

        servo.apply(ActuatorCommand::for_state(&config, LockState::Locked));
        assert_eq!(servo.lock_state(&config), Some(LockState::Locked));
        assert_eq!(servo.applied(), 2);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut servo = ServoEmulator::new();
        servo.apply(ActuatorCommand::new(5, 200));
        assert_eq!(servo.position(5), None);
        assert_eq!(servo.applied(), 0);
    }

    #[test]
    fn test_other_channels_do_not_affect_lock() {
        let config = LockConfig::default();
        let mut servo = ServoEmulator::new();
        servo.apply(ActuatorCommand::new(3, 175));
        assert_eq!(servo.lock_state(&config), None);
        assert_eq!(servo.position(3), Some(175));
    }
}
