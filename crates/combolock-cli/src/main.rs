use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use combolock_controller::{
    CommandTransmitter, LockController, RecordingDiagnostics, SharedLockController,
};
use combolock_core::{Digit, LockConfig, LockState};
use combolock_hardware::mock::{MockSelectorHandle, MockSelectorPanel};
use combolock_network::{
    ActuatorClient, ActuatorClientConfig, ActuatorHandle, ActuatorServer, ServoEmulator,
};

mod config;
mod console;

use config::Cli;
use console::{ConsoleCommand, HELP};

type Controller = SharedLockController<ActuatorHandle, RecordingDiagnostics>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = combolock_core::VERSION, "Starting combination lock host");

    let server = ActuatorServer::bind(settings.server_config())
        .await
        .with_context(|| format!("failed to start actuator server on {}", settings.bind_addr))?;
    let local_addr = server.local_addr()?;
    let actuator = server.handle();

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut server_task = tokio::spawn(server.run_until(async move {
        let _ = stop_rx.changed().await;
    }));

    if cli.emulate_actuator {
        tokio::spawn(run_emulated_servo(local_addr));
    }

    let diagnostics = RecordingDiagnostics::new();
    let transmitter = CommandTransmitter::new(actuator.clone(), diagnostics.clone());
    let controller = SharedLockController::new(
        LockController::new(LockConfig::default(), transmitter)
            .context("lock configuration rejected")?,
    );
    controller.reevaluate();

    let (mut panel, selectors) = MockSelectorPanel::new();
    let panel_controller = controller.clone();
    let panel_task = tokio::spawn(async move { panel_controller.drive(&mut panel).await });

    println!("combolock listening for actuators on {local_addr}");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut server_exit = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            joined = &mut server_task => {
                error!("Actuator server stopped; commands can no longer reach the lock");
                server_exit = Some(joined);
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        let result =
                            execute(command, &selectors, &controller, &diagnostics, &actuator)
                                .await;
                        if let Err(e) = result {
                            error!("Command failed: {e:#}");
                        }
                    }
                    Err(e) => println!("{e:#}"),
                }
            }
        }
    }

    info!("Shutting down");
    drop(selectors);
    match panel_task.await {
        Ok(Err(e)) => warn!("Selector panel stopped with error: {e}"),
        Err(e) => warn!("Selector panel task failed: {e}"),
        Ok(Ok(())) => {}
    }

    let joined = match server_exit {
        Some(joined) => joined,
        None => {
            let _ = stop_tx.send(true);
            server_task.await
        }
    };
    joined.context("actuator server task failed")??;

    if controller.current_lock_state() == LockState::Unlocked {
        warn!("Exiting while the lock is believed to be unlocked");
    }
    Ok(())
}

async fn execute(
    command: ConsoleCommand,
    selectors: &MockSelectorHandle,
    controller: &Controller,
    diagnostics: &RecordingDiagnostics,
    actuator: &ActuatorHandle,
) -> anyhow::Result<()> {
    match command {
        ConsoleCommand::Set { index, value } => {
            selectors.set(index.as_usize(), value.as_u8()).await?;
        }
        ConsoleCommand::Spin { index, values } => {
            let values: Vec<u8> = values.iter().map(Digit::as_u8).collect();
            selectors.spin(index.as_usize(), &values).await?;
        }
        ConsoleCommand::Reset => selectors.reset().await?,
        ConsoleCommand::Status => {
            let status = controller.status();
            let shown: Vec<String> = selectors.values().iter().map(|d| d.to_string()).collect();
            println!("{status}");
            println!("  selectors:      {}", shown.join(" "));
            println!("  believed state: {} (not confirmed by the actuator)", status.state);
            println!("  actuators:      {}", actuator.peer_count());
            if let Some(failure) = diagnostics.last_failure() {
                println!(
                    "  last failure:   {} at {}: {}",
                    failure.command,
                    failure.at.format("%H:%M:%S"),
                    failure.error
                );
            }
        }
        ConsoleCommand::History => {
            let transitions = controller.with(|c| c.last_transitions(10));
            if transitions.is_empty() {
                println!("no lock transitions yet");
            }
            for t in transitions {
                println!(
                    "{}  {} -> {}  {}{}",
                    t.at.format("%H:%M:%S%.3f"),
                    t.from,
                    t.to,
                    t.command,
                    if t.delivered { "" } else { "  (not delivered)" }
                );
            }
        }
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

async fn run_emulated_servo(server_addr: SocketAddr) {
    let server_addr = if server_addr.ip().is_unspecified() {
        SocketAddr::from(([127, 0, 0, 1], server_addr.port()))
    } else {
        server_addr
    };

    let mut client = ActuatorClient::new(ActuatorClientConfig {
        server_addr,
        ..Default::default()
    });
    if let Err(e) = client.connect().await {
        error!("Emulated servo could not connect: {e}");
        return;
    }

    let mut servo = ServoEmulator::new();
    if let Err(e) = servo.run(&mut client, &LockConfig::default()).await {
        error!("Emulated servo stopped: {e}");
    }
}
