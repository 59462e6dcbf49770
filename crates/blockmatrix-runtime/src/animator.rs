#![forbid(unsafe_code)]

//! Free-running activity animation on a dedicated ticker thread.
//!
//! The animator is a two-state machine:
//!
//! ```text
//!   Stopped --start()--> Running --stop()--> Stopped
//! ```
//!
//! `start` while running and `stop` while stopped are no-ops. Each tick runs
//! under the matrix's mutation gate, so ticks never interleave with fills.
//!
//! # Cancellation
//!
//! [`ActivityAnimator::stop`] signals the ticker and joins it before
//! returning. Once it returns no further tick can touch the grid. A tick
//! that is already overdue when the stop signal arrives still runs, so a
//! caller that waited at least one interval always observes a tick.
//!
//! # Randomness
//!
//! The animator owns a single generator for its whole lifetime. It moves
//! into the ticker thread on `start` and comes back on `stop`, so restarting
//! continues the same stream instead of reseeding.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use blockmatrix_core::{BlockMatrixError, DEFAULT_OFF_BIAS, MatrixConfig, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::matrix::BlockMatrix;

/// Default tick period.
pub const DEFAULT_INTERVAL: Duration = blockmatrix_core::config::DEFAULT_INTERVAL;

/// Lifecycle state of an [`ActivityAnimator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Stopped,
    Running,
}

struct Ticker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<StdRng>,
}

/// Periodically randomizes every cell of a [`BlockMatrix`].
pub struct ActivityAnimator {
    matrix: BlockMatrix,
    interval: Duration,
    off_bias: Arc<AtomicU8>,
    ticks: Arc<AtomicU64>,
    rng: Option<StdRng>,
    ticker: Option<Ticker>,
}

impl std::fmt::Debug for ActivityAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityAnimator")
            .field("state", &self.state())
            .field("interval", &self.interval)
            .field("off_bias", &self.off_bias())
            .field("ticks", &self.ticks())
            .finish()
    }
}

impl ActivityAnimator {
    /// Animator with the default interval (100 ms) and off bias (`0xC0`),
    /// seeded from the operating system.
    #[must_use]
    pub fn new(matrix: BlockMatrix) -> Self {
        Self::with_rng(matrix, StdRng::from_os_rng())
    }

    /// Animator with a fixed seed, for reproducible animations.
    #[must_use]
    pub fn with_seed(matrix: BlockMatrix, seed: u64) -> Self {
        Self::with_rng(matrix, StdRng::seed_from_u64(seed))
    }

    fn with_rng(matrix: BlockMatrix, rng: StdRng) -> Self {
        Self {
            matrix,
            interval: DEFAULT_INTERVAL,
            off_bias: Arc::new(AtomicU8::new(DEFAULT_OFF_BIAS)),
            ticks: Arc::new(AtomicU64::new(0)),
            rng: Some(rng),
            ticker: None,
        }
    }

    /// Animator using the interval, off bias, and seed of `config`.
    pub fn from_config(matrix: BlockMatrix, config: &MatrixConfig) -> Result<Self> {
        config.check()?;
        let mut animator = match config.seed {
            Some(seed) => Self::with_seed(matrix, seed),
            None => Self::new(matrix),
        };
        animator.interval = config.interval;
        animator.set_off_bias(config.off_bias);
        Ok(animator)
    }

    #[must_use]
    pub fn state(&self) -> AnimatorState {
        if self.ticker.is_some() {
            AnimatorState::Running
        } else {
            AnimatorState::Stopped
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == AnimatorState::Running
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the tick period. Takes effect on the next `start`.
    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(BlockMatrixError::InvalidConfiguration {
                field: "interval",
                value: format!("{interval:?}"),
                message: "interval must be positive".into(),
            });
        }
        self.interval = interval;
        Ok(())
    }

    /// Current off bias. Higher values switch more cells off per tick.
    #[must_use]
    pub fn off_bias(&self) -> u8 {
        self.off_bias.load(Ordering::Relaxed)
    }

    /// Change the off bias. Takes effect from the next tick, even while running.
    pub fn set_off_bias(&self, off_bias: u8) {
        self.off_bias.store(off_bias, Ordering::Relaxed);
    }

    /// Ticks completed since this animator was created.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// The matrix this animator drives.
    #[must_use]
    pub fn matrix(&self) -> &BlockMatrix {
        &self.matrix
    }

    /// Start ticking. No-op if already running.
    pub fn start(&mut self) -> io::Result<()> {
        if self.ticker.is_some() {
            return Ok(());
        }
        let mut rng = self.rng.take().unwrap_or_else(StdRng::from_os_rng);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let matrix = self.matrix.clone();
        let off_bias = Arc::clone(&self.off_bias);
        let ticks = Arc::clone(&self.ticks);
        let interval = self.interval;
        // Measured from the call, not from when the thread gets scheduled.
        let first_deadline = Instant::now() + interval;

        let handle = thread::Builder::new()
            .name("blockmatrix-activity".into())
            .spawn(move || {
                tick_loop(
                    &matrix,
                    interval,
                    first_deadline,
                    &off_bias,
                    &ticks,
                    &stop_rx,
                    &mut rng,
                );
                rng
            })?;

        info!(interval_ms = interval.as_millis() as u64, "activity animator started");
        self.ticker = Some(Ticker { stop_tx, handle });
        Ok(())
    }

    /// Stop ticking and wait for the ticker to exit. No-op if stopped.
    pub fn stop(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        let _ = ticker.stop_tx.send(());
        match ticker.handle.join() {
            Ok(rng) => self.rng = Some(rng),
            Err(_) => warn!("activity ticker panicked; generator will be reseeded"),
        }
        info!(ticks = self.ticks(), "activity animator stopped");
    }
}

impl Drop for ActivityAnimator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_loop(
    matrix: &BlockMatrix,
    interval: Duration,
    first_deadline: Instant,
    off_bias: &AtomicU8,
    ticks: &AtomicU64,
    stop_rx: &mpsc::Receiver<()>,
    rng: &mut StdRng,
) {
    let mut deadline = first_deadline;
    loop {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                tick_once(matrix, off_bias, ticks, rng);
                deadline += interval;
                let now = Instant::now();
                if deadline < now {
                    // Fell behind (slow sink); skip missed ticks instead of bursting.
                    deadline = now + interval;
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if Instant::now() >= deadline {
                    tick_once(matrix, off_bias, ticks, rng);
                }
                return;
            }
        }
    }
}

fn tick_once(matrix: &BlockMatrix, off_bias: &AtomicU8, ticks: &AtomicU64, rng: &mut StdRng) {
    let bias = off_bias.load(Ordering::Relaxed);
    match matrix.tick(rng, bias) {
        Some(Ok(usage)) => {
            ticks.fetch_add(1, Ordering::AcqRel);
            trace!(usage = %usage, bias, "activity tick");
        }
        Some(Err(err)) => {
            ticks.fetch_add(1, Ordering::AcqRel);
            trace!(%err, "activity tick on empty grid");
        }
        None => debug!("activity tick skipped: grid not built"),
    }
}
