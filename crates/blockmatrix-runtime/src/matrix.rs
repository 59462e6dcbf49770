#![forbid(unsafe_code)]

//! Shared matrix handle with a single mutation gate.
//!
//! [`BlockMatrix`] owns the [`Grid`], the [`FillEngine`], and the queue of
//! fills that arrived before the grid was built. All of it sits behind one
//! mutex, so a fill, a clear, a rebuild, and an animator tick can never
//! interleave their read-then-write passes over the cells.
//!
//! # Deferred fills
//!
//! A fill issued before [`BlockMatrix::build`] is validated immediately and
//! then queued together with the strategy and color mode in effect at that
//! moment. `build` drains the queue in issuance order before releasing the
//! gate, so a later fill can never overtake a queued one. Callers that need
//! to block until the grid exists use [`BlockMatrix::wait_ready`], which
//! parks on a condition variable; nothing spins.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Value outside 0..=100 | caller error | `InvalidConfiguration`, nothing queued or mutated |
//! | Usage of a zero-cell grid | unbuilt or 0×N grid | `EmptyGridMetric` |
//! | Poisoned gate | a sink panicked mid-write | lock recovered; cells stay individually consistent |

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use blockmatrix_core::{
    Cell, FillEngine, FillOutcome, FillRequest, FillStrategy, Grid, MatrixConfig, Palette,
    RenderSink, Result, Usage,
};
use rand::Rng;
use tracing::{debug, warn};

/// Result of [`BlockMatrix::set_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// The grid was ready and the fill ran to completion.
    Applied(FillOutcome),
    /// The grid is not built yet; the fill waits at this queue position.
    Queued { position: usize },
}

struct MatrixState {
    grid: Grid,
    engine: FillEngine,
    pending: VecDeque<FillRequest>,
    value: Option<u8>,
    usage: Option<Usage>,
    columns: usize,
    rows: usize,
}

impl MatrixState {
    fn refresh_usage(&mut self) {
        self.usage = self.grid.usage().ok();
    }

    fn apply(&mut self, request: FillRequest) -> Result<FillOutcome> {
        let outcome = self.engine.apply(&mut self.grid, request)?;
        self.refresh_usage();
        Ok(outcome)
    }
}

struct Shared {
    state: Mutex<MatrixState>,
    ready: Condvar,
}

/// Cloneable handle to one block matrix.
///
/// Clones share the same grid and gate.
#[derive(Clone)]
pub struct BlockMatrix {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for BlockMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("BlockMatrix")
            .field("grid", &state.grid)
            .field("strategy", &state.engine.strategy())
            .field("value", &state.value)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl BlockMatrix {
    /// Matrix with default configuration reporting to `sink`.
    #[must_use]
    pub fn new(sink: impl RenderSink + 'static) -> Self {
        Self::from_parts(MatrixConfig::default(), sink)
    }

    /// Matrix from an explicit configuration.
    ///
    /// The configuration is validated here; the grid is not built until
    /// [`build`](Self::build) or [`build_default`](Self::build_default).
    pub fn with_config(config: MatrixConfig, sink: impl RenderSink + 'static) -> Result<Self> {
        config.check()?;
        Ok(Self::from_parts(config, sink))
    }

    fn from_parts(config: MatrixConfig, sink: impl RenderSink + 'static) -> Self {
        let engine = match config.seed {
            Some(seed) => FillEngine::with_seed(config.strategy, seed),
            None => FillEngine::new(config.strategy),
        }
        .with_randomize_colors(config.randomize_colors);
        let state = MatrixState {
            grid: Grid::new(sink).with_palette(config.palette),
            engine,
            pending: VecDeque::new(),
            value: None,
            usage: None,
            columns: config.columns,
            rows: config.rows,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                ready: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MatrixState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Build (or rebuild) the grid and run every queued fill in order.
    ///
    /// Returns the number of queued fills that were applied.
    pub fn build(&self, columns: usize, rows: usize) -> Result<usize> {
        let mut state = self.lock();
        state.grid.build(columns, rows)?;
        state.columns = columns;
        state.rows = rows;

        let mut drained = 0;
        while let Some(request) = state.pending.pop_front() {
            match state.apply(request) {
                Ok(outcome) => {
                    debug!(value = request.value, ?outcome, "queued fill applied");
                    drained += 1;
                }
                Err(err) => warn!(%err, value = request.value, "queued fill dropped"),
            }
        }
        state.refresh_usage();
        drop(state);

        self.shared.ready.notify_all();
        Ok(drained)
    }

    /// Build with the configured dimensions (19×4 unless overridden).
    pub fn build_default(&self) -> Result<usize> {
        let (columns, rows) = {
            let state = self.lock();
            (state.columns, state.rows)
        };
        self.build(columns, rows)
    }

    /// Whether the grid has been built.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lock().grid.is_built()
    }

    /// Block until the grid is built or `timeout` elapses.
    ///
    /// Returns whether the grid is ready.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .shared
            .ready
            .wait_timeout_while(state, timeout, |s| !s.grid.is_built())
            .unwrap_or_else(PoisonError::into_inner);
        state.grid.is_built()
    }

    /// Fill to `value` percent with the current strategy.
    ///
    /// Out-of-range values are rejected before anything is queued or
    /// touched. Before the grid is built the fill is queued instead.
    pub fn set_value(&self, value: i64) -> Result<FillStatus> {
        let mut state = self.lock();
        let request = state.engine.request(value)?;
        state.value = Some(request.value);

        if !state.grid.is_built() {
            state.pending.push_back(request);
            let position = state.pending.len() - 1;
            debug!(
                value = request.value,
                strategy = request.strategy.as_str(),
                position,
                "fill queued until grid is built"
            );
            return Ok(FillStatus::Queued { position });
        }

        state.apply(request).map(FillStatus::Applied)
    }

    /// Last accepted fill value.
    #[must_use]
    pub fn value(&self) -> Option<u8> {
        self.lock().value
    }

    #[must_use]
    pub fn strategy(&self) -> FillStrategy {
        self.lock().engine.strategy()
    }

    /// Strategy for subsequent fills; queued fills keep theirs.
    pub fn set_strategy(&self, strategy: FillStrategy) {
        self.lock().engine.set_strategy(strategy);
    }

    #[must_use]
    pub fn randomize_colors(&self) -> bool {
        self.lock().engine.randomize_colors()
    }

    pub fn set_randomize_colors(&self, enabled: bool) {
        self.lock().engine.set_randomize_colors(enabled);
    }

    #[must_use]
    pub fn palette(&self) -> Palette {
        self.lock().grid.palette()
    }

    /// Palette for subsequent writes.
    pub fn set_palette(&self, palette: Palette) {
        self.lock().grid.set_palette(palette);
    }

    /// Turn every cell off.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.grid.clear();
        state.refresh_usage();
    }

    /// Usage computed from the current cells.
    pub fn usage(&self) -> Result<Usage> {
        self.lock().grid.usage()
    }

    /// Usage as published by the last fill, clear, build, or animator tick.
    #[must_use]
    pub fn last_usage(&self) -> Option<Usage> {
        self.lock().usage
    }

    /// The `"<percent> %"` label of the current usage.
    pub fn usage_label(&self) -> Result<String> {
        self.usage().map(|u| u.label())
    }

    /// Number of fills waiting for the grid.
    #[must_use]
    pub fn pending_fills(&self) -> usize {
        self.lock().pending.len()
    }

    /// Active flags in build order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<bool> {
        self.lock().grid.snapshot()
    }

    /// Copy of every cell in build order.
    #[must_use]
    pub fn cells(&self) -> Vec<Cell> {
        self.lock().grid.cells().to_vec()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().grid.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the grid under the gate.
    pub fn with_grid<R>(&self, f: impl FnOnce(&Grid) -> R) -> R {
        f(&self.lock().grid)
    }

    /// Run one activity tick under the gate.
    ///
    /// Returns `None` when the grid is not built yet.
    pub(crate) fn tick<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        off_bias: u8,
    ) -> Option<Result<Usage>> {
        let mut state = self.lock();
        if !state.grid.is_built() {
            return None;
        }
        let result = blockmatrix_core::randomize_tick(&mut state.grid, rng, off_bias);
        state.usage = result.as_ref().ok().copied();
        Some(result)
    }
}

impl Default for BlockMatrix {
    fn default() -> Self {
        Self::new(blockmatrix_core::NullSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockmatrix_core::{BlockMatrixError, RecordingSink};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::thread;

    fn seeded(strategy: FillStrategy) -> BlockMatrix {
        let config = MatrixConfig::default().with_strategy(strategy).with_seed(7);
        BlockMatrix::with_config(config, RecordingSink::new()).unwrap()
    }

    #[test]
    fn fill_before_build_is_queued() {
        let matrix = seeded(FillStrategy::Straight);
        assert_eq!(
            matrix.set_value(50).unwrap(),
            FillStatus::Queued { position: 0 }
        );
        assert_eq!(matrix.pending_fills(), 1);
        assert_eq!(matrix.value(), Some(50));

        assert_eq!(matrix.build_default().unwrap(), 1);
        assert_eq!(matrix.pending_fills(), 0);
        assert_eq!(matrix.usage().unwrap().percent(), 50);
        assert_eq!(matrix.last_usage().unwrap().active(), 38);
    }

    #[test]
    fn queued_fills_apply_in_order_with_their_own_strategy() {
        let matrix = seeded(FillStrategy::Bars);
        matrix.set_value(50).unwrap();
        matrix.set_strategy(FillStrategy::Straight);
        assert_eq!(
            matrix.set_value(10).unwrap(),
            FillStatus::Queued { position: 1 }
        );

        assert_eq!(matrix.build(10, 2).unwrap(), 2);
        // Straight 10% of 20 cells runs last and overwrites every cell.
        let active: Vec<usize> = matrix
            .cells()
            .iter()
            .filter(|c| c.active)
            .map(|c| c.id)
            .collect();
        assert_eq!(active, vec![0, 1]);
    }

    #[test]
    fn invalid_value_is_not_queued() {
        let matrix = seeded(FillStrategy::Random);
        assert!(matrix.set_value(101).unwrap_err().is_invalid_configuration());
        assert!(matrix.set_value(-5).is_err());
        assert_eq!(matrix.pending_fills(), 0);
        assert_eq!(matrix.value(), None);
    }

    #[test]
    fn fill_after_build_applies_immediately() {
        let matrix = seeded(FillStrategy::Random);
        matrix.build(19, 4).unwrap();
        let status = matrix.set_value(30).unwrap();
        assert_eq!(
            status,
            FillStatus::Applied(FillOutcome::Filled {
                target: 22,
                activated: 22
            })
        );
        assert_eq!(matrix.usage_label().unwrap(), "29 %");
    }

    #[test]
    fn zero_value_keeps_pattern_and_clear_blanks_it() {
        let matrix = seeded(FillStrategy::Straight);
        matrix.build_default().unwrap();
        matrix.set_value(40).unwrap();
        let before = matrix.snapshot();
        assert_eq!(
            matrix.set_value(0).unwrap(),
            FillStatus::Applied(FillOutcome::Unchanged)
        );
        assert_eq!(matrix.snapshot(), before);
        assert_eq!(matrix.value(), Some(0));

        matrix.clear();
        assert_eq!(matrix.usage().unwrap().percent(), 0);
        assert_eq!(matrix.last_usage().unwrap().percent(), 0);
    }

    #[test]
    fn usage_of_unbuilt_or_empty_grid_is_an_error() {
        let matrix = BlockMatrix::default();
        assert_eq!(matrix.usage(), Err(BlockMatrixError::EmptyGridMetric));
        matrix.build(0, 3).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.usage(), Err(BlockMatrixError::EmptyGridMetric));
        assert!(matrix.last_usage().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = MatrixConfig::default().with_interval(Duration::ZERO);
        let err = BlockMatrix::with_config(config, RecordingSink::new()).unwrap_err();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn wait_ready_wakes_on_build() {
        let matrix = BlockMatrix::default();
        assert!(!matrix.wait_ready(Duration::from_millis(5)));

        let builder = matrix.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            builder.build(4, 4).unwrap();
        });
        assert!(matrix.wait_ready(Duration::from_secs(5)));
        handle.join().unwrap();
        assert_eq!(matrix.len(), 16);
    }

    #[test]
    fn tick_skips_unbuilt_grid() {
        let matrix = BlockMatrix::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matrix.tick(&mut rng, 0).is_none());
        matrix.build(5, 5).unwrap();
        let usage = matrix.tick(&mut rng, 0).unwrap().unwrap();
        assert_eq!(usage.percent(), 100);
        assert_eq!(matrix.last_usage(), Some(usage));
    }

    #[test]
    fn settings_round_trip() {
        let matrix = BlockMatrix::default();
        matrix.set_strategy(FillStrategy::BarsReverse);
        matrix.set_randomize_colors(true);
        let palette = Palette::new(blockmatrix_core::Rgb::new(1, 2, 3), Palette::DEFAULT_OFF);
        matrix.set_palette(palette);
        assert_eq!(matrix.strategy(), FillStrategy::BarsReverse);
        assert!(matrix.randomize_colors());
        assert_eq!(matrix.palette(), palette);
        assert!(format!("{matrix:?}").contains("BarsReverse"));
    }

    #[test]
    fn with_grid_reads_under_the_gate() {
        let matrix = seeded(FillStrategy::Bars);
        matrix.build(3, 3).unwrap();
        matrix.set_value(34).unwrap();
        let columns: Vec<usize> =
            matrix.with_grid(|g| g.cells_where(|c| c.active).map(|c| c.column).collect());
        assert_eq!(columns, vec![0, 0, 0]);
    }
}
