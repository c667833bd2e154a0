//! # dyno-rs
//!
//! Async Rust core for strength-training trackers: connect to a measurement
//! device that emits one scalar value on a fixed cadence (a grip dynamometer,
//! a force plate, a synthetic clock), record readings into one of two
//! mutually exclusive training sessions, and compute the session maximum.
//!
//! ## Training modes
//!
//! | Mode | Buffer | On stop |
//! |---|---|---|
//! | `Usual` | last 20 readings | buffer kept for display / export |
//! | `Max` | last 20 readings | maximum computed and kept as `last_max` |
//!
//! Only one mode records at a time.  Readings that arrive while no session is
//! recording are dropped.  A disconnect discards all buffered data.
//!
//! ## Quick start
//!
//! ```no_run
//! use dyno_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = SimulatedSource::new(SimulatorConfig::default());
//!     let mut controller = ConnectionController::new(source, ControllerConfig::default());
//!     controller.connect().await?;
//!     controller.start_recording(TrainingMode::Max)?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!
//!     let stopped = controller.stop_recording()?;
//!     println!("max = {:?}", stopped.max);
//!     controller.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`prelude`] | One-line glob import of the most commonly needed types |
//! | [`controller`] | Connection lifecycle and the command surface for UIs |
//! | [`session`] | Recording state machine and per-mode buffers |
//! | [`buffer`] | Fixed-capacity FIFO window over recent readings |
//! | [`stats`] | Maximum computation |
//! | [`source`] | The [`source::ValueSource`] capability plus simulated and hand-fed sources |
//! | [`types`] | Readings, modes, states, and snapshots |
//! | [`error`] | [`error::SessionError`] |

pub mod buffer;
pub mod controller;
pub mod error;
pub mod session;
pub mod source;
pub mod stats;
pub mod types;

// ── Prelude ───────────────────────────────────────────────────────────────────

/// Convenience re-exports for downstream crates.
pub mod prelude {
    // ── Controller and session ────────────────────────────────────────────────
    pub use crate::controller::{ConnectionController, ControllerConfig};
    pub use crate::session::{SessionConfig, SessionManager};

    // ── Sources ───────────────────────────────────────────────────────────────
    pub use crate::source::{
        ManualFeed, ManualSource, SimulatedSource, SimulatorConfig, ValueSource,
    };

    // ── Data types ────────────────────────────────────────────────────────────
    pub use crate::buffer::{RollingBuffer, DEFAULT_WINDOW};
    pub use crate::error::SessionError;
    pub use crate::types::{
        ConnectionState, MaxResult, Reading, RecordingState, SessionSnapshot, StoppedSession,
        TrainingMode,
    };
}
