//! Value sources: anything that streams [`Reading`]s once activated.
//!
//! The controller only sees the [`ValueSource`] capability, so a wireless
//! sensor, a replayed file, or the synthetic [`SimulatedSource`] are
//! interchangeable.

use std::f64::consts::PI;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::types::Reading;

/// Capacity of the reading channel handed out by the bundled sources.
pub const CHANNEL_CAPACITY: usize = 256;

// ── ValueSource ───────────────────────────────────────────────────────────────

/// A device (real or synthetic) that emits scalar readings.
///
/// `activate` starts the stream and returns its receiving end; the stream
/// ends when the sender side is dropped.  `deactivate` stops emission and
/// must be safe to call when not active.
pub trait ValueSource: Send {
    fn activate(&mut self) -> impl Future<Output = Result<mpsc::Receiver<Reading>>> + Send;

    fn deactivate(&mut self) -> impl Future<Output = Result<()>> + Send;
}

// ── SimulatedSource ───────────────────────────────────────────────────────────

/// Configuration for [`SimulatedSource`].
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Milliseconds between readings. Default: `100`.
    pub interval_ms: u64,
    /// Capacity of the reading channel. Default: [`CHANNEL_CAPACITY`].
    pub channel_capacity: usize,
    /// Resting value between efforts. Default: `2.0`.
    pub baseline: f64,
    /// Peak effort above the baseline. Default: `40.0`.
    pub amplitude: f64,
    /// Length of one squeeze-and-release cycle in seconds. Default: `4.0`.
    pub period_secs: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            channel_capacity: CHANNEL_CAPACITY,
            baseline: 2.0,
            amplitude: 40.0,
            period_secs: 4.0,
        }
    }
}

/// Generate one synthetic force sample at time `t` seconds.
///
/// A half-wave rectified sine (effort on, effort off) scaled to `amplitude`
/// on top of `baseline`, with a small deterministic noise floor so the
/// output is reproducible across runs.
pub fn sim_value(t: f64, config: &SimulatorConfig) -> f64 {
    let period = config.period_secs.max(f64::EPSILON);
    let effort = (2.0 * PI * t / period).sin().max(0.0);
    let nx = t * 1000.7 + 137.508;
    let noise = ((nx.sin() * 9973.1).fract() - 0.5) * 0.5;
    (config.baseline + config.amplitude * effort + noise).max(0.0)
}

/// Synthetic force sensor driven by a `tokio::time::interval`.
pub struct SimulatedSource {
    config: SimulatorConfig,
    task: Option<JoinHandle<()>>,
}

impl SimulatedSource {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config, task: None }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl ValueSource for SimulatedSource {
    async fn activate(&mut self) -> Result<mpsc::Receiver<Reading>> {
        if self.config.interval_ms == 0 {
            return Err(anyhow!("simulator interval must be at least 1 ms"));
        }
        if let Some(old) = self.task.take() {
            old.abort();
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let config = self.config.clone();
        info!("simulator: emitting every {} ms", config.interval_ms);

        self.task = Some(tokio::spawn(async move {
            let interval = Duration::from_millis(config.interval_ms);
            let dt = interval.as_secs_f64();
            let mut ticker = tokio::time::interval(interval);
            let mut t = 0.0_f64;
            let mut seq = 0u64;
            loop {
                ticker.tick().await;
                let reading = Reading::new(seq, sim_value(t, &config));
                if tx.send(reading).await.is_err() {
                    debug!("simulator: receiver dropped after {seq} reading(s)");
                    break;
                }
                seq += 1;
                t += dt;
            }
        }));
        Ok(rx)
    }

    async fn deactivate(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("simulator: stopped");
        }
        Ok(())
    }
}

// ── ManualSource ──────────────────────────────────────────────────────────────

/// A source whose readings are pushed by hand through a [`ManualFeed`].
///
/// Useful for embedding the session manager behind a transport that is
/// driven elsewhere, and for deterministic tests.
pub struct ManualSource {
    shared: Arc<Mutex<FeedState>>,
    capacity: usize,
}

#[derive(Default)]
struct FeedState {
    tx: Option<mpsc::Sender<Reading>>,
    next_seq: u64,
    activations: usize,
    fail_next: Option<String>,
}

/// Producer handle paired with a [`ManualSource`].
#[derive(Clone)]
pub struct ManualFeed {
    shared: Arc<Mutex<FeedState>>,
}

impl ManualSource {
    pub fn new() -> (Self, ManualFeed) {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, ManualFeed) {
        let shared = Arc::new(Mutex::new(FeedState::default()));
        let source = Self {
            shared: Arc::clone(&shared),
            capacity: capacity.max(1),
        };
        (source, ManualFeed { shared })
    }
}

impl ValueSource for ManualSource {
    async fn activate(&mut self) -> Result<mpsc::Receiver<Reading>> {
        let mut state = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(reason) = state.fail_next.take() {
            return Err(anyhow!(reason));
        }
        let (tx, rx) = mpsc::channel(self.capacity);
        state.tx = Some(tx);
        state.next_seq = 0;
        state.activations += 1;
        Ok(rx)
    }

    async fn deactivate(&mut self) -> Result<()> {
        let mut state = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        state.tx = None;
        Ok(())
    }
}

impl ManualFeed {
    fn lock(&self) -> std::sync::MutexGuard<'_, FeedState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit `value` as the next reading.
    ///
    /// Returns `false` when the source is not active or the receiver is gone
    /// or full.
    pub fn push(&self, value: f64) -> bool {
        let mut state = self.lock();
        let seq = state.next_seq;
        let Some(tx) = state.tx.as_ref() else {
            return false;
        };
        if tx.try_send(Reading::new(seq, value)).is_err() {
            return false;
        }
        state.next_seq += 1;
        true
    }

    /// Emit every value in order; returns how many were accepted.
    pub fn push_all(&self, values: &[f64]) -> usize {
        values.iter().take_while(|&&v| self.push(v)).count()
    }

    /// End the stream from the device side, as if the link dropped.
    pub fn close(&self) {
        self.lock().tx = None;
    }

    /// Make the next `activate` fail with `reason`.
    pub fn fail_next_activation(&self, reason: impl Into<String>) {
        self.lock().fail_next = Some(reason.into());
    }

    /// How many times the source has been successfully activated.
    pub fn activations(&self) -> usize {
        self.lock().activations
    }

    pub fn is_active(&self) -> bool {
        self.lock().tx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_value_stays_non_negative_and_bounded() {
        let config = SimulatorConfig::default();
        for i in 0..400 {
            let v = sim_value(i as f64 * 0.05, &config);
            assert!(v >= 0.0);
            assert!(v <= config.baseline + config.amplitude + 1.0);
        }
    }

    #[tokio::test]
    async fn simulator_emits_ordered_readings() {
        let mut source = SimulatedSource::new(SimulatorConfig {
            interval_ms: 1,
            ..Default::default()
        });
        let mut rx = source.activate().await.unwrap();
        for expected in 0..5 {
            let r = rx.recv().await.unwrap();
            assert_eq!(r.seq, expected);
        }
        source.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn simulator_rejects_zero_interval() {
        let mut source = SimulatedSource::new(SimulatorConfig {
            interval_ms: 0,
            ..Default::default()
        });
        assert!(source.activate().await.is_err());
    }

    #[tokio::test]
    async fn manual_feed_requires_activation() {
        let (mut source, feed) = ManualSource::new();
        assert!(!feed.push(1.0));

        let mut rx = source.activate().await.unwrap();
        assert_eq!(feed.push_all(&[1.0, 2.0]), 2);
        assert_eq!(rx.recv().await.unwrap().value, 1.0);
        assert_eq!(rx.recv().await.unwrap().seq, 1);

        source.deactivate().await.unwrap();
        assert!(!feed.push(3.0));
        assert!(rx.recv().await.is_none());
    }
}
