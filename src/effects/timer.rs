//! Restartable one-shot delay timers.
//!
//! Every start is tagged with a generation chosen by the owner. An expiry
//! carries its generation back so the owner can discard one that raced
//! with a cancel or restart.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// A single outstanding countdown.
///
/// `start` replaces any outstanding countdown, so it also serves as
/// restart. After `cancel` returns, the cancelled generation never
/// reports expiry from this timer.
pub trait DelayTimer: Send {
    /// Schedule expiry of `generation` after `delay`. Zero fires on the
    /// next scheduling opportunity.
    fn start(&mut self, delay: Duration, generation: u64);

    /// Drop the outstanding countdown, if any. No-op when idle or
    /// already expired.
    fn cancel(&mut self);
}

/// Callback receiving the generation of an expired countdown.
pub type ExpiryCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Timer backed by a spawned `tokio::time::sleep`.
///
/// Must be started from within a tokio runtime.
pub struct TokioTimer {
    on_expiry: ExpiryCallback,
    outstanding: Option<(u64, JoinHandle<()>)>,
}

impl TokioTimer {
    pub fn new<F>(on_expiry: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        Self {
            on_expiry: Arc::new(on_expiry),
            outstanding: None,
        }
    }

    /// Generation of the countdown that has neither fired nor been
    /// cancelled.
    pub fn outstanding(&self) -> Option<u64> {
        self.outstanding
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(generation, _)| *generation)
    }
}

impl DelayTimer for TokioTimer {
    fn start(&mut self, delay: Duration, generation: u64) {
        self.cancel();

        let on_expiry = Arc::clone(&self.on_expiry);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_expiry(generation);
        });
        trace!(generation, ?delay, "delay timer started");
        self.outstanding = Some((generation, handle));
    }

    fn cancel(&mut self) {
        if let Some((generation, handle)) = self.outstanding.take() {
            handle.abort();
            trace!(generation, "delay timer cancelled");
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Timer that never fires on its own.
///
/// The driver decides when time has passed and calls [`fire`](Self::fire).
/// Useful for simulations and deterministic tests of the machine.
#[derive(Debug, Default)]
pub struct ManualTimer {
    outstanding: Option<(u64, Duration)>,
    starts: usize,
    cancels: usize,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation and delay of the outstanding countdown.
    pub fn outstanding(&self) -> Option<(u64, Duration)> {
        self.outstanding
    }

    /// Expire the outstanding countdown, returning its generation.
    pub fn fire(&mut self) -> Option<u64> {
        self.outstanding.take().map(|(generation, _)| generation)
    }

    /// Number of `start` calls so far.
    pub fn starts(&self) -> usize {
        self.starts
    }

    /// Number of `cancel` calls that dropped an outstanding countdown.
    pub fn cancels(&self) -> usize {
        self.cancels
    }
}

impl DelayTimer for ManualTimer {
    fn start(&mut self, delay: Duration, generation: u64) {
        self.starts += 1;
        self.outstanding = Some((generation, delay));
    }

    fn cancel(&mut self) {
        if self.outstanding.take().is_some() {
            self.cancels += 1;
        }
    }
}
