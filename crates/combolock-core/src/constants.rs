//! Named constants for the lock and its actuator wire contract.
//!
//! The actuator command frame is two raw bytes with no framing, checksum or
//! acknowledgment:
//!
//! ```text
//! +---------+----------+
//! | channel | position |
//! +---------+----------+
//!   byte 0    byte 1
//! ```
//!
//! | Constant | Value | Meaning |
//! |----------|-------|---------|
//! | `SERVO_CHANNEL` | 5 | Port the lock servo is wired to |
//! | `LOCKED_POSITION` | 5 | Servo angle that engages the bolt |
//! | `UNLOCKED_POSITION` | 175 | Servo angle that disengages the bolt |
//!
//! Some servos cannot travel all the way to 0 or 180 degrees, which is why
//! the two positions sit just inside the range.
//!
//! # Usage
//!
//! ```
//! use combolock_core::constants::*;
//!
//! assert_eq!(FRAME_SIZE, 2);
//! assert!(UNLOCKED_POSITION <= MAX_SERVO_POSITION);
//! assert_eq!(DEFAULT_COMBINATION.len(), SELECTOR_COUNT);
//! ```

// ============================================================================
// Selectors and combination
// ============================================================================

/// Number of digit selectors on the lock face.
pub const SELECTOR_COUNT: usize = 4;

/// Highest value a single digit selector can show.
pub const MAX_DIGIT: u8 = 9;

/// The secret combination compiled into the controller.
pub const DEFAULT_COMBINATION: [u8; SELECTOR_COUNT] = [1, 2, 3, 4];

// ============================================================================
// Actuator
// ============================================================================

/// Servo channel addressed by every lock command.
pub const SERVO_CHANNEL: u8 = 0x05;

/// Servo position that engages the lock.
pub const LOCKED_POSITION: u8 = 5;

/// Servo position that disengages the lock.
pub const UNLOCKED_POSITION: u8 = 175;

/// Largest angle a hobby servo accepts.
pub const MAX_SERVO_POSITION: u8 = 180;

/// Size in bytes of one actuator command frame.
pub const FRAME_SIZE: usize = 2;

// ============================================================================
// Network
// ============================================================================

/// TCP port the actuator bridge connects to.
pub const DEFAULT_ACTUATOR_PORT: u16 = 4567;

/// Default number of simultaneous actuator bridge connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 4;

/// Default depth of the outbound command queue.
///
/// Commands are edge-triggered so the queue rarely holds more than one or
/// two frames; a full queue means the server task has stalled.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default timeout for actuator client I/O in milliseconds.
pub const DEFAULT_CLIENT_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Status text
// ============================================================================

/// Status shown when the entered combination matches.
pub const STATUS_UNLOCKED: &str = "Unlocked!";

/// Status shown when the entered combination does not match.
pub const STATUS_INVALID_PIN: &str = "Invalid PIN";
