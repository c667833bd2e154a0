//! Data types shared by the session manager, the controller, and callers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

// ── Timestamp helper ──────────────────────────────────────────────────────────

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
        * 1000.0
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// One scalar value emitted by the device.
///
/// Readings are ephemeral: they live in a mode's rolling buffer and nowhere
/// else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// Monotonic sequence number assigned by the source (starts at 0 for each
    /// activation).
    pub seq: u64,
    /// Wall-clock timestamp in milliseconds since Unix epoch.
    pub timestamp: f64,
    /// Measured value in device units (e.g. kgf for a grip dynamometer).
    pub value: f64,
}

impl Reading {
    pub fn new(seq: u64, value: f64) -> Self {
        Self {
            seq,
            timestamp: now_ms(),
            value,
        }
    }
}

// ── Modes and states ──────────────────────────────────────────────────────────

/// The two mutually exclusive recording contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingMode {
    /// General workout session.
    Usual,
    /// "Find your maximum" session; a maximum is computed on stop.
    Max,
}

impl TrainingMode {
    pub const ALL: [TrainingMode; 2] = [TrainingMode::Usual, TrainingMode::Max];
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usual => write!(f, "usual"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// Whether the controller currently holds a subscription to the value source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Which mode, if any, is recording.
///
/// A single tagged value rather than one flag per mode: two modes recording
/// at once is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "mode")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording(TrainingMode),
}

impl RecordingState {
    pub const RECORDING_USUAL: Self = Self::Recording(TrainingMode::Usual);
    pub const RECORDING_MAX: Self = Self::Recording(TrainingMode::Max);

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The recording mode, or `None` when idle.
    pub fn mode(&self) -> Option<TrainingMode> {
        match self {
            Self::Idle => None,
            Self::Recording(mode) => Some(*mode),
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Recording(mode) => write!(f, "recording {mode}"),
        }
    }
}

// ── Results and snapshots ─────────────────────────────────────────────────────

/// Maximum computed over a Max-mode session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaxResult {
    /// Largest value in the buffer at the time of computation.
    pub value: f64,
    /// Number of readings the maximum was taken over.
    pub samples: usize,
}

/// Outcome of a successful [`crate::session::SessionManager::stop_recording`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoppedSession {
    pub mode: TrainingMode,
    /// Readings in the stopped mode's buffer, oldest first.
    pub readings: Vec<Reading>,
    /// `Some` for Max sessions only.
    pub max: Option<MaxResult>,
}

/// A consistent, read-only copy of the session manager's state.
///
/// Taken under a single lock so the recording state and the buffer contents
/// always belong together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub viewed_mode: TrainingMode,
    pub recording: RecordingState,
    pub usual: Vec<Reading>,
    pub max: Vec<Reading>,
    pub last_max: Option<MaxResult>,
}

impl SessionSnapshot {
    /// The buffer snapshot for `mode`.
    pub fn buffer(&self, mode: TrainingMode) -> &[Reading] {
        match mode {
            TrainingMode::Usual => &self.usual,
            TrainingMode::Max => &self.max,
        }
    }

    /// Just the values of `mode`'s buffer, oldest first.
    pub fn values(&self, mode: TrainingMode) -> Vec<f64> {
        self.buffer(mode).iter().map(|r| r.value).collect()
    }
}
