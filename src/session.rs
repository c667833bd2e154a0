//! Training session state machine.
//!
//! [`SessionManager`] decides which mode's buffer, if any, an incoming
//! reading lands in:
//!
//! ```text
//!            start(Usual)                 start(Max)
//!   RecordingUsual <──────── Idle ────────> RecordingMax
//!          │                  ▲  ▲                │
//!          └──── stop() ──────┘  └──── stop() ────┘
//!                      reset() from any state → Idle
//! ```
//!
//! Starting the *other* mode while one is recording is refused with
//! [`SessionError::AlreadyRecording`].  Changing the viewed mode is always
//! allowed and never touches the recording.

use log::{debug, info, warn};

use crate::buffer::{RollingBuffer, DEFAULT_WINDOW};
use crate::error::{Result, SessionError};
use crate::stats::compute_max;
use crate::types::{
    MaxResult, Reading, RecordingState, SessionSnapshot, StoppedSession, TrainingMode,
};

// ── SessionConfig ─────────────────────────────────────────────────────────────

/// Configuration for [`SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Readings kept per mode. Default: `20`.
    pub window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

// ── SessionManager ────────────────────────────────────────────────────────────

/// Owns the recording state, both per-mode buffers, and the last maximum.
#[derive(Debug)]
pub struct SessionManager {
    viewed: TrainingMode,
    recording: RecordingState,
    usual: RollingBuffer,
    max: RollingBuffer,
    last_max: Option<MaxResult>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            viewed: TrainingMode::Usual,
            recording: RecordingState::Idle,
            usual: RollingBuffer::new(config.window),
            max: RollingBuffer::new(config.window),
            last_max: None,
        }
    }

    pub fn recording(&self) -> RecordingState {
        self.recording
    }

    pub fn viewed_mode(&self) -> TrainingMode {
        self.viewed
    }

    pub fn last_max(&self) -> Option<MaxResult> {
        self.last_max
    }

    pub fn buffer(&self, mode: TrainingMode) -> &RollingBuffer {
        match mode {
            TrainingMode::Usual => &self.usual,
            TrainingMode::Max => &self.max,
        }
    }

    fn buffer_mut(&mut self, mode: TrainingMode) -> &mut RollingBuffer {
        match mode {
            TrainingMode::Usual => &mut self.usual,
            TrainingMode::Max => &mut self.max,
        }
    }

    /// Switch the mode being viewed. Does not start, stop, or redirect a
    /// recording.
    pub fn select_mode(&mut self, mode: TrainingMode) {
        if let Some(active) = self.recording.mode() {
            if active != mode {
                debug!("viewing {mode} while {active} keeps recording");
            }
        }
        self.viewed = mode;
    }

    /// Begin recording `mode`.
    ///
    /// From `Idle` this clears `mode`'s buffer (and the last maximum for
    /// [`TrainingMode::Max`]) so the new session starts blank.  Starting the
    /// mode that is already recording is a no-op.
    pub fn start_recording(&mut self, mode: TrainingMode) -> Result<()> {
        match self.recording {
            RecordingState::Recording(active) if active == mode => {
                debug!("start_recording({mode}): already recording, ignoring");
                Ok(())
            }
            RecordingState::Recording(active) => {
                warn!("start_recording({mode}) refused: {active} is recording");
                Err(SessionError::AlreadyRecording { active })
            }
            RecordingState::Idle => {
                self.buffer_mut(mode).clear();
                if mode == TrainingMode::Max {
                    self.last_max = None;
                }
                self.viewed = mode;
                self.recording = RecordingState::Recording(mode);
                info!("{mode} session started");
                Ok(())
            }
        }
    }

    /// Stop the active session and return to `Idle`.
    ///
    /// The buffer is left intact for display or export.  A Max session's
    /// maximum is computed here and kept as [`Self::last_max`]; if that buffer
    /// is empty the session still stops but
    /// [`SessionError::EmptySessionMax`] is returned.
    pub fn stop_recording(&mut self) -> Result<StoppedSession> {
        let Some(mode) = self.recording.mode() else {
            return Err(SessionError::NotRecording);
        };
        self.recording = RecordingState::Idle;

        let buf = self.buffer(mode);
        let readings = buf.snapshot();
        let max = match mode {
            TrainingMode::Usual => None,
            TrainingMode::Max => {
                let Some(m) = compute_max(buf.iter()) else {
                    warn!("max session stopped with no readings");
                    return Err(SessionError::EmptySessionMax);
                };
                self.last_max = Some(m);
                Some(m)
            }
        };

        info!(
            "{mode} session stopped: {} reading(s){}",
            readings.len(),
            max.map(|m| format!(", max {:.2}", m.value)).unwrap_or_default()
        );
        Ok(StoppedSession {
            mode,
            readings,
            max,
        })
    }

    /// Route one reading to the recording mode's buffer.
    ///
    /// Dropped when idle.  Non-finite values are dropped as well so a maximum
    /// is always a real number.
    pub fn on_reading(&mut self, reading: Reading) {
        let Some(mode) = self.recording.mode() else {
            return;
        };
        if !reading.value.is_finite() {
            warn!("dropping non-finite reading #{}: {}", reading.seq, reading.value);
            return;
        }
        self.buffer_mut(mode).append(reading);
    }

    /// Force `Idle` and clear both buffers and the last maximum, even mid
    /// session.
    pub fn reset(&mut self) {
        if let Some(mode) = self.recording.mode() {
            info!("{mode} session discarded by reset");
        }
        self.recording = RecordingState::Idle;
        self.usual.clear();
        self.max.clear();
        self.last_max = None;
    }

    /// Running maximum of the Max buffer, for live display.
    pub fn current_max(&self) -> Option<MaxResult> {
        compute_max(self.max.iter())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            viewed_mode: self.viewed,
            recording: self.recording,
            usual: self.usual.snapshot(),
            max: self.max.snapshot(),
            last_max: self.last_max,
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
