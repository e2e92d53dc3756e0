//! Deskswitch main entry point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  Relays          Deck             HueSensor   RelayNotifier  │
//! │  (GpioPort)      (PanelPort)      (Presence)  (Notifier)     │
//! │  axum router     stdin presses                               │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │           SwitchBoard (one lock, pure dispatch)        │  │
//! │  │  Action · ButtonStateStore · sync flag                 │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  PresenceMonitor (debounce, own task)                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use deskswitch::adapters::gpio::{Relays, SimulatedGpio};
use deskswitch::adapters::hue::HueSensor;
use deskswitch::adapters::panel::{Deck, spawn_stdin_presses};
use deskswitch::adapters::relay::RelayNotifier;
use deskswitch::adapters::http;
use deskswitch::app::ports::PanelPort;
use deskswitch::app::service::SwitchBoard;
use deskswitch::app::store::ButtonStateStore;
use deskswitch::config::SwitchboardConfig;
use deskswitch::presence::PresenceMonitor;

/// Press events buffered between the panel driver and the dispatcher.
const PRESS_QUEUE_CAP: usize = 16;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Reset the button panel and exit
    #[arg(short = 'r', long)]
    reset: bool,

    /// Run without panel and GPIO hardware
    #[arg(short = 'n', long)]
    no_hardware: bool,

    /// Path to configuration file
    #[arg(short = 'c', long, default_value = "config.json")]
    config: PathBuf,

    /// Path to state file
    #[arg(short = 's', long, default_value = "state.json")]
    state: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    info!("Deskswitch v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration and persisted state ──────────────────
    let config = SwitchboardConfig::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;

    if args.reset {
        info!("Resetting panel");
        let mut deck = Deck::open(false, config.panel_slots).context("opening panel for reset")?;
        deck.reset().context("resetting panel")?;
        return Ok(());
    }

    let store = ButtonStateStore::restore(&args.state)
        .with_context(|| format!("restoring state from {}", args.state.display()))?;

    // ── 3. Adapters ───────────────────────────────────────────
    let relays = open_relays(&config, args.no_hardware)?;
    let panel = Deck::open(args.no_hardware, config.panel_slots).context("initialising panel")?;
    let (press_tx, press_rx) = mpsc::channel(PRESS_QUEUE_CAP);
    match &panel {
        Deck::Simulated(_) => spawn_stdin_presses(press_tx),
    }
    let notifier = RelayNotifier::new(config.sensor_relay_url.clone(), config.sensor_timeout())
        .context("building relay client")?;

    let presence = if config.philips_hue_sensor_url.is_empty() {
        None
    } else {
        let sensor = HueSensor::new(config.philips_hue_sensor_url.clone(), config.sensor_timeout())
            .context("building sensor client")?;
        Some(PresenceMonitor::new(
            sensor,
            config.hold_threshold(),
            config.poll_interval(),
        ))
    };
    let listen_addr = config.listen_addr.clone();

    let board = SwitchBoard::new(config, store, relays, panel, notifier, args.state.clone());

    // ── 4. Trigger surfaces ───────────────────────────────────
    board.init_panel().await;

    tokio::spawn(board.clone().run_press_loop(press_rx));

    // ── 5. Presence monitor ───────────────────────────────────
    if let Some(monitor) = presence {
        let presence_board = board.clone();
        tokio::spawn(monitor.run(move |present| {
            let board = presence_board.clone();
            async move { board.on_presence_changed(present).await }
        }));
    } else {
        info!("No presence sensor configured");
    }

    // ── 6. HTTP server until SIGINT/SIGTERM ───────────────────
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {}", listen_addr))?;
    http::serve(listener, board.clone(), shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // ── 7. Best-effort cleanup ────────────────────────────────
    info!("Shutting down, blanking panel");
    board.blank_panel().await;
    Ok(())
}

#[cfg(feature = "rpi")]
fn open_relays(config: &SwitchboardConfig, no_hardware: bool) -> Result<Relays> {
    if no_hardware {
        return Ok(Relays::Simulated(SimulatedGpio));
    }
    let bank = deskswitch::adapters::gpio::open_rpi_relays(&config.relay_pins())
        .context("initialising GPIO")?;
    Ok(Relays::Pi(bank))
}

#[cfg(not(feature = "rpi"))]
fn open_relays(_config: &SwitchboardConfig, no_hardware: bool) -> Result<Relays> {
    if !no_hardware {
        anyhow::bail!("built without GPIO support; rebuild with --features rpi or pass -n");
    }
    Ok(Relays::Simulated(SimulatedGpio))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
