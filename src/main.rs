//! # Joyhub
//!
//! Watches connected game controllers and logs what they do.
//!
//! Runs the controller manager at the configured frame rate, logging hot-plug,
//! button presses and changes of the active input source.

use anyhow::{Context, Result};
use tokio::time::interval;
use tracing::{debug, info, warn};

use joyhub::config::Config;
use joyhub::controller::Controller;
use joyhub::device::EvdevBackend;
use joyhub::event::{EventKind, InputEvent};
use joyhub::manager::ControllerManager;

/// Main entry point for Joyhub
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load the configuration file given as the first argument, if any
///    - Scan `/dev/input` for controllers
///
/// 2. **Main Loop**
///    - Poll device events once per frame
///    - Feed them to the controller manager
///    - Log presses and active source changes
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Close every controller
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - `/dev/input` cannot be read
///
/// # Examples
///
/// ```bash
/// RUST_LOG=joyhub=debug cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Joyhub v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::default(),
    };

    let backend = EvdevBackend::new().context("Failed to open /dev/input")?;
    let mut manager = ControllerManager::new(backend).with_config(&config);

    manager.on_connect(|controller| {
        info!(
            "Controller connected: {} via {:?}",
            controller,
            controller.connection_type()
        );
    });
    manager.on_disconnect(|controller| info!("Controller disconnected: {}", controller));

    for controller in manager.get_all_controllers() {
        info!("Found {}", controller);
    }
    if manager.is_empty() {
        warn!("No controllers found, waiting for hot-plug");
    }

    let frame_rate = config.manager.frame_rate_hz;
    let mut frame = interval(config.manager.frame_interval());
    let mut source = manager.active_source();

    info!("Polling controllers at {}Hz", frame_rate);
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = frame.tick() => {
                let events = manager.backend_mut().poll_events();
                manager.handle_events(&events);

                if manager.active_source() != source {
                    source = manager.active_source();
                    info!("Active input source: {}", source);
                }

                log_presses(&manager, &events);
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    manager.shutdown();
    Ok(())
}

fn log_presses(manager: &ControllerManager<EvdevBackend>, events: &[InputEvent]) {
    for event in events {
        let EventKind::JoyButtonDown { joy, button } = event.kind else {
            continue;
        };
        let Some(controller) = manager.get_controller(joy) else {
            continue;
        };
        if let Some(logical) = controller.logical_button(button) {
            info!(
                "{}: {} pressed",
                controller,
                logical.display_name(controller.controller_type())
            );
        }
        log_state(controller);
    }
}

fn log_state(controller: &Controller) {
    match serde_json::to_string(controller.state()) {
        Ok(json) => debug!("{} state: {}", controller, json),
        Err(e) => debug!("Failed to serialize state of {}: {}", controller, e),
    }
}
