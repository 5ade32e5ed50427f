//! Actuator command wire format.
//!
//! Every command the lock controller issues is a two-byte frame
//! `[channel, position]` written raw onto the byte stream to the actuator
//! bridge. This crate provides the [`ActuatorCommand`] value type and the
//! [`ServoCodec`] that plugs the frame format into Tokio's `Framed` streams.

pub mod codec;
pub mod command;

pub use codec::ServoCodec;
pub use command::ActuatorCommand;
