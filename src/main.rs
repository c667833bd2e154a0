use std::io::{self, BufRead};

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use dyno_rs::controller::{ConnectionController, ControllerConfig};
use dyno_rs::session::SessionConfig;
use dyno_rs::source::{SimulatedSource, SimulatorConfig};
use dyno_rs::types::{ConnectionState, MaxResult, SessionSnapshot, TrainingMode};

/// Drive a training session against the built-in force simulator.
#[derive(Parser, Debug)]
#[command(name = "dyno", version, about)]
struct Cli {
    /// Milliseconds between simulated readings.
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Readings kept per training mode.
    #[arg(long, default_value_t = dyno_rs::buffer::DEFAULT_WINDOW)]
    window: usize,

    /// Give up connecting after this many seconds.
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Peak simulated effort above the resting value.
    #[arg(long, default_value_t = 40.0)]
    amplitude: f64,
}

fn print_status(
    snap: &SessionSnapshot,
    connection: ConnectionState,
    streaming: bool,
    live_max: Option<MaxResult>,
) {
    println!(
        "[STATUS] {connection}{}  viewing={}  {}  usual={}  max={}  live_max={}  last_max={}",
        if connection == ConnectionState::Connected && !streaming {
            " (stream ended)"
        } else {
            ""
        },
        snap.viewed_mode,
        snap.recording,
        snap.usual.len(),
        snap.max.len(),
        live_max
            .map(|m| format!("{:.2}", m.value))
            .unwrap_or_else(|| "-".into()),
        snap.last_max
            .map(|m| format!("{:.2}", m.value))
            .unwrap_or_else(|| "-".into()),
    );
    let values = snap.values(snap.viewed_mode);
    let shown: Vec<String> = values.iter().map(|v| format!("{v:.1}")).collect();
    println!("[{}] [{}]", snap.viewed_mode, shown.join(", "));
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ───────────────────────────────────────────────────────────────
    // Set RUST_LOG=debug for verbose output, e.g.:
    //   RUST_LOG=dyno_rs=debug cargo run
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let source = SimulatedSource::new(SimulatorConfig {
        interval_ms: cli.interval_ms,
        amplitude: cli.amplitude,
        ..Default::default()
    });
    let config = ControllerConfig {
        session: SessionConfig { window: cli.window },
        connect_timeout_secs: cli.connect_timeout_secs,
    };
    let mut controller = ConnectionController::new(source, config);

    info!("Commands (type + Enter):");
    info!("  c  – connect            d  – disconnect");
    info!("  u  – view usual mode    m  – view max mode");
    info!("  s  – start viewed mode  x  – stop recording");
    info!("  p  – print status       j  – print snapshot as JSON");
    info!("  q  – quit\n");

    // ── Stdin command loop ────────────────────────────────────────────────────
    // Lines are read on a dedicated OS thread (StdinLock is not Send) and
    // relayed to the async loop below.
    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l.trim().to_owned()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    // ── Main loop ─────────────────────────────────────────────────────────────
    while let Some(line) = line_rx.recv().await {
        match line.as_str() {
            "" => continue,
            "q" => {
                info!("Quit requested.");
                break;
            }
            "c" => {
                if let Err(e) = controller.connect().await {
                    error!("{e}");
                }
            }
            "d" => controller.disconnect().await,
            "u" => controller.select_mode(TrainingMode::Usual),
            "m" => controller.select_mode(TrainingMode::Max),
            "s" => {
                if let Err(e) = controller.start_viewed() {
                    error!("{e}");
                }
            }
            "x" => match controller.stop_recording() {
                Ok(stopped) => {
                    println!(
                        "[STOPPED] {} session, {} reading(s)",
                        stopped.mode,
                        stopped.readings.len()
                    );
                    if let Some(m) = stopped.max {
                        println!("[MAX] {:.2} over {} reading(s)", m.value, m.samples);
                    }
                }
                Err(e) => error!("{e}"),
            },
            "p" => {
                print_status(
                    &controller.snapshot(),
                    controller.connection_state(),
                    controller.is_streaming(),
                    controller.current_max(),
                );
            }
            "j" => println!("{}", serde_json::to_string_pretty(&controller.snapshot())?),
            cmd => error!("Unknown command: '{cmd}'"),
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────
    controller.disconnect().await;
    info!("Event loop finished – exiting.");
    Ok(())
}
