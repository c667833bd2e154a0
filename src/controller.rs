//! Connection lifecycle: one subscription to a [`ValueSource`], readings
//! forwarded into a shared [`SessionManager`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, SessionError};
use crate::session::{SessionConfig, SessionManager};
use crate::source::ValueSource;
use crate::types::{
    ConnectionState, MaxResult, Reading, RecordingState, SessionSnapshot, StoppedSession,
    TrainingMode,
};

// ── ControllerConfig ──────────────────────────────────────────────────────────

/// Configuration for [`ConnectionController`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub session: SessionConfig,
    /// Upper bound on [`ValueSource::activate`]; a source that has not come
    /// up by then is treated as a failed connection. Default: `10`.
    pub connect_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            connect_timeout_secs: 10,
        }
    }
}

// ── Subscription ──────────────────────────────────────────────────────────────

/// The live half of a connection: the forwarding task and its kill switch.
struct Subscription {
    /// Checked by the forwarding task under the session lock before every
    /// append; cleared by `disconnect` under the same lock.
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

fn lock(session: &Mutex<SessionManager>) -> MutexGuard<'_, SessionManager> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Forward readings into `session` in arrival order until the stream ends or
/// the subscription is cancelled.
fn spawn_forwarder(
    mut rx: mpsc::Receiver<Reading>,
    session: Arc<Mutex<SessionManager>>,
    alive: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut delivered: u64 = 0;
        while let Some(reading) = rx.recv().await {
            let forwarded = {
                let mut s = lock(&session);
                if alive.load(Ordering::Acquire) {
                    s.on_reading(reading);
                    true
                } else {
                    false
                }
            };
            if !forwarded {
                debug!("forwarder: cancelled, dropping reading #{}", reading.seq);
                return;
            }
            delivered += 1;
        }
        info!("forwarder: source stream ended after {delivered} reading(s)");
    })
}

// ── ConnectionController ──────────────────────────────────────────────────────

/// Owns the connection to a value source and the session manager it feeds.
///
/// Commands (`select_mode`, `start_recording`, `stop_recording`) and reading
/// delivery serialize on one lock around the session manager, so a reading
/// can never land in a buffer after its session was stopped and read.
pub struct ConnectionController<S: ValueSource> {
    source: S,
    config: ControllerConfig,
    session: Arc<Mutex<SessionManager>>,
    subscription: Option<Subscription>,
}

impl<S: ValueSource> ConnectionController<S> {
    pub fn new(source: S, config: ControllerConfig) -> Self {
        let session = SessionManager::new(config.session.clone());
        Self {
            source,
            config,
            session: Arc::new(Mutex::new(session)),
            subscription: None,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.subscription.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// `true` while connected and the source is still emitting.
    ///
    /// Turns `false` if the source ends its stream on its own (for example a
    /// dropped link); the connection stays `Connected` until
    /// [`Self::disconnect`] is called.
    pub fn is_streaming(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|sub| !sub.task.is_finished())
    }

    /// Activate the source and start forwarding its readings.
    ///
    /// A no-op when already connected.  On failure the controller stays
    /// disconnected and nothing is left subscribed.
    pub async fn connect(&mut self) -> Result<()> {
        if self.subscription.is_some() {
            debug!("connect: already connected, ignoring");
            return Ok(());
        }

        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let rx = match tokio::time::timeout(timeout, self.source.activate()).await {
            Ok(Ok(rx)) => rx,
            Ok(Err(e)) => {
                warn!("connect: source activation failed: {e:#}");
                if let Err(cleanup) = self.source.deactivate().await {
                    warn!("connect: cleanup after failed activation failed: {cleanup:#}");
                }
                return Err(SessionError::ConnectionFailed(format!("{e:#}")));
            }
            Err(_) => {
                warn!("connect: source activation timed out after {timeout:?}");
                if let Err(e) = self.source.deactivate().await {
                    warn!("connect: cleanup after timeout failed: {e:#}");
                }
                return Err(SessionError::ConnectionFailed(format!(
                    "activation timed out after {} s",
                    self.config.connect_timeout_secs
                )));
            }
        };

        let alive = Arc::new(AtomicBool::new(true));
        let task = spawn_forwarder(rx, Arc::clone(&self.session), Arc::clone(&alive));
        self.subscription = Some(Subscription { alive, task });
        info!("connected");
        Ok(())
    }

    /// Release the subscription and reset the session manager.
    ///
    /// Idempotent.  Once this returns no further reading is forwarded, both
    /// buffers are empty, and the recording state is `Idle`.
    pub async fn disconnect(&mut self) {
        let Some(sub) = self.subscription.take() else {
            debug!("disconnect: already disconnected");
            return;
        };

        {
            let mut s = lock(&self.session);
            sub.alive.store(false, Ordering::Release);
            s.reset();
        }

        sub.task.abort();
        if let Err(e) = sub.task.await {
            if !e.is_cancelled() {
                warn!("disconnect: forwarder task failed: {e}");
            }
        }
        if let Err(e) = self.source.deactivate().await {
            warn!("disconnect: source deactivation failed: {e:#}");
        }
        info!("disconnected");
    }

    // ── Session commands ─────────────────────────────────────────────────────

    pub fn select_mode(&self, mode: TrainingMode) {
        lock(&self.session).select_mode(mode);
    }

    pub fn start_recording(&self, mode: TrainingMode) -> Result<()> {
        lock(&self.session).start_recording(mode)
    }

    /// Start recording whichever mode is currently viewed.
    pub fn start_viewed(&self) -> Result<()> {
        let mut s = lock(&self.session);
        let mode = s.viewed_mode();
        s.start_recording(mode)
    }

    pub fn stop_recording(&self) -> Result<StoppedSession> {
        lock(&self.session).stop_recording()
    }

    // ── Read-only views ──────────────────────────────────────────────────────

    pub fn recording_state(&self) -> RecordingState {
        lock(&self.session).recording()
    }

    pub fn last_max(&self) -> Option<MaxResult> {
        lock(&self.session).last_max()
    }

    pub fn current_max(&self) -> Option<MaxResult> {
        lock(&self.session).current_max()
    }

    /// Consistent copy of the recording state and both buffers.
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.session).snapshot()
    }
}

impl<S: ValueSource> Drop for ConnectionController<S> {
    /// Cancel forwarding when dropped without [`ConnectionController::disconnect`].
    ///
    /// The source cannot be deactivated here (that needs an `.await`), but
    /// aborting the forwarder drops the reading receiver, which ends any
    /// source that stops on a closed channel.
    fn drop(&mut self) {
        if let Some(sub) = self.subscription.take() {
            {
                let mut s = lock(&self.session);
                sub.alive.store(false, Ordering::Release);
                s.reset();
            }
            sub.task.abort();
            debug!("controller dropped while connected: forwarding cancelled");
        }
    }
}
