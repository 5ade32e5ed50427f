//! Tokio codec for actuator command frames.
//!
//! `ServoCodec` implements [`Decoder`] and [`Encoder<ActuatorCommand>`] so a
//! TCP stream can be wrapped in `Framed` and used as a `Sink`/`Stream` of
//! commands.
//!
//! ```text
//! TCP Stream -> Decoder -> ActuatorCommand
//! ActuatorCommand -> Encoder -> TCP Stream ([channel, position])
//! ```
//!
//! Frames are fixed-size, so decoding never scans for delimiters: the
//! decoder waits until two bytes are buffered and splits them off.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use combolock_protocol::{ActuatorCommand, ServoCodec};
//!
//! # async fn example() -> combolock_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:4567").await?;
//! let mut framed = Framed::new(stream, ServoCodec::new());
//!
//! framed.send(ActuatorCommand::new(5, 175)).await?;
//!
//! if let Some(Ok(command)) = framed.next().await {
//!     println!("Received: {}", command);
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::ActuatorCommand;
use combolock_core::{Error, Result, constants::FRAME_SIZE};

/// Tokio codec for two-byte actuator frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServoCodec;

impl ServoCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ServoCodec {
    type Item = ActuatorCommand;
    type Error = Error;

    /// Decode one command from the byte stream.
    ///
    /// Returns `Ok(None)` until a full frame is buffered. Leftover bytes stay
    /// in `src` for the next call.
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Decoder;
    /// use combolock_protocol::{ActuatorCommand, ServoCodec};
    ///
    /// let mut codec = ServoCodec::new();
    /// let mut buffer = BytesMut::from(&[5u8, 175, 5][..]);
    ///
    /// assert_eq!(codec.decode(&mut buffer).unwrap(), Some(ActuatorCommand::new(5, 175)));
    /// assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    /// assert_eq!(buffer.len(), 1);
    /// ```
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < FRAME_SIZE {
            src.reserve(FRAME_SIZE - src.len());
            return Ok(None);
        }

        let channel = src.get_u8();
        let position = src.get_u8();
        Ok(Some(ActuatorCommand::new(channel, position)))
    }
}

impl Encoder<ActuatorCommand> for ServoCodec {
    type Error = Error;

    fn encode(&mut self, item: ActuatorCommand, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(FRAME_SIZE);
        dst.put_slice(&item.to_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_needs_full_frame() {
        let mut codec = ServoCodec::new();
        let mut buffer = BytesMut::new();

        assert!(codec.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(&[5]);
        assert!(codec.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(&[175]);
        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(ActuatorCommand::new(5, 175))
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_back_to_back_frames() {
        let mut codec = ServoCodec::new();
        let mut buffer = BytesMut::from(&[5u8, 175, 5, 5][..]);

        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(ActuatorCommand::new(5, 175))
        );
        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(ActuatorCommand::new(5, 5))
        );
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_encode_writes_exactly_two_bytes() {
        let mut codec = ServoCodec::new();
        let mut buffer = BytesMut::new();

        codec.encode(ActuatorCommand::new(5, 5), &mut buffer).unwrap();
        assert_eq!(&buffer[..], &[5, 5]);

        codec
            .encode(ActuatorCommand::new(5, 175), &mut buffer)
            .unwrap();
        assert_eq!(&buffer[..], &[5, 5, 5, 175]);
    }
}
