//! Integration tests for ActuatorServer and ActuatorClient
//!
//! These tests run the real accept loop on a loopback port and exercise the
//! full path from `Transport::try_send` to bytes read by the actuator side.

use std::time::Duration;

use combolock_core::{LockConfig, LockState};
use combolock_network::{
    ActuatorClient, ActuatorClientConfig, ActuatorHandle, ActuatorServer, ActuatorServerConfig,
    ClientError, ServoEmulator, Transport, TransportError,
};
use combolock_protocol::ActuatorCommand;
use tokio::time::{sleep, timeout};

async fn start_server(max_connections: usize) -> (ActuatorHandle, ActuatorClientConfig) {
    let server = ActuatorServer::bind(ActuatorServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_connections,
        queue_capacity: 8,
    })
    .await
    .unwrap();

    let handle = server.handle();
    let client_config = ActuatorClientConfig {
        server_addr: server.local_addr().unwrap(),
        timeout: Duration::from_millis(1000),
    };

    tokio::spawn(server.run());
    (handle, client_config)
}

async fn connect(config: &ActuatorClientConfig) -> ActuatorClient {
    let mut client = ActuatorClient::new(config.clone());
    client.connect().await.unwrap();
    client
}

async fn wait_for_peers(handle: &ActuatorHandle, expected: usize) {
    timeout(Duration::from_secs(5), async {
        while handle.peer_count() != expected {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("peer count never reached expected value");
}

#[tokio::test]
async fn test_command_reaches_actuator() {
    let (handle, client_config) = start_server(4).await;
    let mut client = connect(&client_config).await;
    wait_for_peers(&handle, 1).await;

    handle.try_send(&[5, 175]).unwrap();
    handle.try_send(&[5, 5]).unwrap();

    assert_eq!(client.recv().await.unwrap(), ActuatorCommand::new(5, 175));
    assert_eq!(client.recv().await.unwrap(), ActuatorCommand::new(5, 5));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_no_peer_until_connected() {
    let (handle, client_config) = start_server(4).await;

    assert_eq!(handle.try_send(&[5, 175]), Err(TransportError::NoPeer));

    let _client = connect(&client_config).await;
    wait_for_peers(&handle, 1).await;

    assert!(handle.try_send(&[5, 175]).is_ok());
}

#[tokio::test]
async fn test_commands_fan_out_to_every_peer() {
    let (handle, client_config) = start_server(4).await;
    let mut first = connect(&client_config).await;
    let mut second = connect(&client_config).await;
    wait_for_peers(&handle, 2).await;

    handle.try_send(&[5, 175]).unwrap();

    assert_eq!(first.recv().await.unwrap(), ActuatorCommand::new(5, 175));
    assert_eq!(second.recv().await.unwrap(), ActuatorCommand::new(5, 175));
}

#[tokio::test]
async fn test_peer_disconnect_is_detected() {
    let (handle, client_config) = start_server(4).await;
    let mut client = connect(&client_config).await;
    wait_for_peers(&handle, 1).await;

    client.close().await.unwrap();
    wait_for_peers(&handle, 0).await;

    assert_eq!(handle.try_send(&[5, 5]), Err(TransportError::NoPeer));
}

#[tokio::test]
async fn test_max_connections_rejects_extra_peer() {
    let (handle, client_config) = start_server(1).await;
    let _accepted = connect(&client_config).await;
    wait_for_peers(&handle, 1).await;

    let mut rejected = connect(&client_config).await;
    let result = rejected.recv().await;
    assert!(matches!(
        result,
        Err(ClientError::ConnectionLost(_)) | Err(ClientError::Io(_))
    ));
    assert_eq!(handle.peer_count(), 1);
}

#[tokio::test]
async fn test_inbound_frames_are_ignored() {
    let (handle, client_config) = start_server(4).await;
    let mut client = connect(&client_config).await;
    wait_for_peers(&handle, 1).await;

    client.send(ActuatorCommand::new(9, 90)).await.unwrap();
    handle.try_send(&[5, 175]).unwrap();

    assert_eq!(client.recv().await.unwrap(), ActuatorCommand::new(5, 175));
    assert_eq!(handle.peer_count(), 1);
}

#[tokio::test]
async fn test_servo_emulator_follows_commands() {
    let server = ActuatorServer::bind(ActuatorServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..Default::default()
    })
    .await
    .unwrap();
    let handle = server.handle();
    let mut client = connect(&ActuatorClientConfig {
        server_addr: server.local_addr().unwrap(),
        timeout: Duration::from_millis(1000),
    })
    .await;

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server_task = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));
    wait_for_peers(&handle, 1).await;

    let config = LockConfig::default();
    let emulator_config = config.clone();
    let servo_task = tokio::spawn(async move {
        let mut servo = ServoEmulator::new();
        servo.run(&mut client, &emulator_config).await.unwrap();
        servo
    });

    for state in [LockState::Unlocked, LockState::Locked, LockState::Unlocked] {
        handle
            .send_command(ActuatorCommand::for_state(&config, state))
            .unwrap();
    }

    // Let the frames land, then close every connection from the server side
    sleep(Duration::from_millis(200)).await;
    stop_tx.send(()).unwrap();
    server_task.await.unwrap().unwrap();

    let servo = timeout(Duration::from_secs(5), servo_task)
        .await
        .expect("emulator did not stop after server shutdown")
        .unwrap();

    assert_eq!(servo.applied(), 3);
    assert_eq!(servo.lock_state(&config), Some(LockState::Unlocked));
}
