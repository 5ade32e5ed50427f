//! Integration tests for ServoCodec with Tokio streams.

use combolock_core::{LockConfig, LockState};
use combolock_protocol::{ActuatorCommand, ServoCodec};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::codec::Framed;

fn create_framed_duplex(
    buffer_size: usize,
) -> (
    Framed<DuplexStream, ServoCodec>,
    Framed<DuplexStream, ServoCodec>,
) {
    let (client, server) = tokio::io::duplex(buffer_size);
    (
        Framed::new(client, ServoCodec::new()),
        Framed::new(server, ServoCodec::new()),
    )
}

#[tokio::test]
async fn test_unlock_then_lock_sequence() {
    let (mut controller_side, mut actuator_side) = create_framed_duplex(64);
    let config = LockConfig::default();

    controller_side
        .send(ActuatorCommand::for_state(&config, LockState::Unlocked))
        .await
        .unwrap();
    controller_side
        .send(ActuatorCommand::for_state(&config, LockState::Locked))
        .await
        .unwrap();

    let first = actuator_side.next().await.unwrap().unwrap();
    let second = actuator_side.next().await.unwrap().unwrap();

    assert_eq!(first.to_bytes(), [5, 175]);
    assert_eq!(second.to_bytes(), [5, 5]);
}

#[tokio::test]
async fn test_frame_split_across_writes() {
    let (mut raw, server) = tokio::io::duplex(64);
    let mut actuator_side = Framed::new(server, ServoCodec::new());

    let reader = tokio::spawn(async move { actuator_side.next().await.unwrap().unwrap() });

    raw.write_all(&[5]).await.unwrap();
    raw.flush().await.unwrap();
    tokio::task::yield_now().await;
    raw.write_all(&[175]).await.unwrap();
    raw.flush().await.unwrap();

    assert_eq!(reader.await.unwrap(), ActuatorCommand::new(5, 175));
}

#[tokio::test]
async fn test_stream_ends_cleanly_on_frame_boundary() {
    let (mut controller_side, mut actuator_side) = create_framed_duplex(64);

    controller_side
        .send(ActuatorCommand::new(5, 5))
        .await
        .unwrap();
    drop(controller_side);

    assert_eq!(
        actuator_side.next().await.unwrap().unwrap(),
        ActuatorCommand::new(5, 5)
    );
    assert!(actuator_side.next().await.is_none());
}
