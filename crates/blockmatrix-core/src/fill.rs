#![forbid(unsafe_code)]

//! Fill engine: turns a target percentage into a concrete active set.
//!
//! Every strategy derives the same target count,
//! `floor(total * value / 100)`, in integer arithmetic so that 100 lights
//! every cell. A value of 0 is a no-op that leaves the previous pattern in
//! place; use [`Grid::clear`] to blank the matrix.
//!
//! | Strategy | Clears first | Order |
//! |----------|--------------|-------|
//! | `Straight` | no (overwrites every cell) | build order prefix |
//! | `Random` | yes | repeated uniform draw from the inactive pool |
//! | `Bars` | yes | lowest column, then lowest row |
//! | `BarsReverse` | yes | highest column, then lowest row |

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::cell::Cell;
use crate::color::{Palette, Rgb};
use crate::error::{BlockMatrixError, Result};
use crate::grid::Grid;

/// How a target percentage is laid out over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillStrategy {
    #[default]
    Random,
    Straight,
    Bars,
    BarsReverse,
}

impl FillStrategy {
    pub const ALL: [Self; 4] = [Self::Random, Self::Straight, Self::Bars, Self::BarsReverse];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Straight => "straight",
            Self::Bars => "bars",
            Self::BarsReverse => "bars-reverse",
        }
    }

    /// Parse a strategy name (case-insensitive; `_` and `-` are interchangeable).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "random" => Some(Self::Random),
            "straight" => Some(Self::Straight),
            "bars" => Some(Self::Bars),
            "bars-reverse" | "bars-rtl" | "bars-right-to-left" => Some(Self::BarsReverse),
            _ => None,
        }
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `value` is a percentage in `0..=100`.
pub fn validate_percent(value: i64) -> Result<u8> {
    if (0..=100).contains(&value) {
        Ok(value as u8)
    } else {
        Err(BlockMatrixError::invalid(
            "value",
            value,
            "expected a percentage in 0..=100",
        ))
    }
}

/// Number of cells a fill at `percent` activates on `total` cells.
#[must_use]
pub fn target_count(total: usize, percent: u8) -> usize {
    (total as u128 * u128::from(percent) / 100) as usize
}

/// A validated fill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRequest {
    pub strategy: FillStrategy,
    pub value: u8,
    pub randomize_colors: bool,
}

impl FillRequest {
    /// Validate `value` and build a request.
    pub fn new(strategy: FillStrategy, value: i64) -> Result<Self> {
        Ok(Self {
            strategy,
            value: validate_percent(value)?,
            randomize_colors: false,
        })
    }

    #[must_use]
    pub fn with_randomize_colors(mut self, enabled: bool) -> Self {
        self.randomize_colors = enabled;
        self
    }
}

/// What a fill did to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// The value was 0; no cell was touched.
    Unchanged,
    /// The strategy ran. `activated` can fall short of `target` only if the
    /// inactive pool ran dry.
    Filled { target: usize, activated: usize },
}

/// Applies fill strategies to a grid.
///
/// Owns one generator for the whole lifetime of the engine; draws are never
/// reseeded.
#[derive(Debug, Clone)]
pub struct FillEngine {
    strategy: FillStrategy,
    randomize_colors: bool,
    rng: StdRng,
}

impl Default for FillEngine {
    fn default() -> Self {
        Self::new(FillStrategy::default())
    }
}

impl FillEngine {
    /// Engine seeded from the operating system.
    #[must_use]
    pub fn new(strategy: FillStrategy) -> Self {
        Self::from_rng(strategy, StdRng::from_os_rng())
    }

    /// Engine with a fixed seed, for reproducible fills.
    #[must_use]
    pub fn with_seed(strategy: FillStrategy, seed: u64) -> Self {
        Self::from_rng(strategy, StdRng::seed_from_u64(seed))
    }

    fn from_rng(strategy: FillStrategy, rng: StdRng) -> Self {
        Self {
            strategy,
            randomize_colors: false,
            rng,
        }
    }

    #[must_use]
    pub fn with_randomize_colors(mut self, enabled: bool) -> Self {
        self.randomize_colors = enabled;
        self
    }

    #[must_use]
    pub fn strategy(&self) -> FillStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: FillStrategy) {
        self.strategy = strategy;
    }

    #[must_use]
    pub fn randomize_colors(&self) -> bool {
        self.randomize_colors
    }

    pub fn set_randomize_colors(&mut self, enabled: bool) {
        self.randomize_colors = enabled;
    }

    /// Request for `value` using the engine's current settings.
    pub fn request(&self, value: i64) -> Result<FillRequest> {
        Ok(FillRequest::new(self.strategy, value)?.with_randomize_colors(self.randomize_colors))
    }

    /// Fill `grid` to `value` percent with the current strategy.
    pub fn fill(&mut self, grid: &mut Grid, value: i64) -> Result<FillOutcome> {
        let request = self.request(value)?;
        self.apply(grid, request)
    }

    /// Apply an already validated request.
    ///
    /// Fails with [`BlockMatrixError::NotReady`] if the grid was never built.
    pub fn apply(&mut self, grid: &mut Grid, request: FillRequest) -> Result<FillOutcome> {
        validate_percent(i64::from(request.value))?;
        if !grid.is_built() {
            return Err(BlockMatrixError::NotReady);
        }
        if request.value == 0 {
            return Ok(FillOutcome::Unchanged);
        }

        let target = target_count(grid.len(), request.value);
        let _span = tracing::debug_span!(
            "fill",
            strategy = request.strategy.as_str(),
            value = request.value,
            target
        )
        .entered();

        let mut painter = Painter {
            rng: &mut self.rng,
            randomize: request.randomize_colors,
        };
        let activated = match request.strategy {
            FillStrategy::Straight => fill_straight(grid, target, &mut painter),
            FillStrategy::Random => fill_random(grid, target, &mut painter),
            FillStrategy::Bars => fill_bars(grid, target, false, &mut painter),
            FillStrategy::BarsReverse => fill_bars(grid, target, true, &mut painter),
        };
        debug!(activated, "fill applied");
        Ok(FillOutcome::Filled { target, activated })
    }
}

/// Picks the color for a cell being switched on.
struct Painter<'a> {
    rng: &'a mut StdRng,
    randomize: bool,
}

impl Painter<'_> {
    fn on_color(&mut self, palette: Palette) -> Rgb {
        if self.randomize {
            Rgb::random(&mut *self.rng)
        } else {
            palette.on
        }
    }
}

fn fill_straight(grid: &mut Grid, target: usize, painter: &mut Painter<'_>) -> usize {
    let palette = grid.palette();
    let mut remaining = target;
    grid.update_each(|_| {
        if remaining >= 1 {
            remaining -= 1;
            (true, painter.on_color(palette))
        } else {
            (false, palette.off)
        }
    });
    target - remaining
}

fn fill_random(grid: &mut Grid, target: usize, painter: &mut Painter<'_>) -> usize {
    grid.clear();
    let mut activated = 0;
    for _ in 0..target {
        let pool: Vec<usize> = grid.cells_where(|c| !c.active).map(|c| c.id).collect();
        if pool.is_empty() {
            break;
        }
        let id = pool[painter.rng.random_range(0..pool.len())];
        let color = painter.on_color(grid.palette());
        if grid.set_cell(id, true, color).is_err() {
            break;
        }
        activated += 1;
    }
    activated
}

fn fill_bars(grid: &mut Grid, target: usize, reverse: bool, painter: &mut Painter<'_>) -> usize {
    grid.clear();
    let mut activated = 0;
    for _ in 0..target {
        let Some(id) = next_bar_cell(grid, reverse) else {
            break;
        };
        let color = painter.on_color(grid.palette());
        if grid.set_cell(id, true, color).is_err() {
            break;
        }
        activated += 1;
    }
    activated
}

/// Inactive cell with the extreme column; ties keep the first in build order.
fn next_bar_cell(grid: &Grid, reverse: bool) -> Option<usize> {
    let mut best: Option<&Cell> = None;
    for cell in grid.cells_where(|c| !c.active) {
        best = match best {
            Some(b) if reverse && cell.column <= b.column => Some(b),
            Some(b) if !reverse && cell.column >= b.column => Some(b),
            _ => Some(cell),
        };
    }
    best.map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    fn grid(columns: usize, rows: usize) -> Grid {
        let mut g = Grid::default();
        g.build(columns, rows).unwrap();
        g
    }

    fn active_ids(grid: &Grid) -> Vec<usize> {
        grid.cells_where(|c| c.active).map(|c| c.id).collect()
    }

    #[test]
    fn strategy_parse_and_display() {
        for s in FillStrategy::ALL {
            assert_eq!(FillStrategy::parse(s.as_str()), Some(s));
            assert_eq!(s.to_string(), s.as_str());
        }
        assert_eq!(
            FillStrategy::parse(" Bars_Reverse "),
            Some(FillStrategy::BarsReverse)
        );
        assert_eq!(FillStrategy::parse("diagonal"), None);
    }

    #[test]
    fn target_count_floors() {
        assert_eq!(target_count(76, 50), 38);
        assert_eq!(target_count(76, 25), 19);
        assert_eq!(target_count(76, 33), 25);
        assert_eq!(target_count(76, 100), 76);
        assert_eq!(target_count(7, 1), 0);
        assert_eq!(target_count(0, 100), 0);
    }

    #[test]
    fn out_of_range_values_rejected() {
        let mut g = grid(4, 4);
        let mut engine = FillEngine::with_seed(FillStrategy::Straight, 1);
        engine.fill(&mut g, 40).unwrap();
        let before = g.snapshot();
        for bad in [-1, 101, i64::MAX, i64::MIN] {
            assert!(engine.fill(&mut g, bad).unwrap_err().is_invalid_configuration());
        }
        assert_eq!(g.snapshot(), before);
    }

    #[test]
    fn unbuilt_grid_is_not_ready() {
        let mut g = Grid::default();
        let mut engine = FillEngine::with_seed(FillStrategy::Bars, 1);
        assert_eq!(engine.fill(&mut g, 50), Err(BlockMatrixError::NotReady));
    }

    #[test]
    fn zero_value_leaves_previous_pattern() {
        for strategy in FillStrategy::ALL {
            let sink = RecordingSink::new();
            let mut g = Grid::new(sink.clone());
            g.build(5, 2).unwrap();
            let mut engine = FillEngine::with_seed(strategy, 9);
            engine.fill(&mut g, 60).unwrap();
            let before = g.snapshot();
            sink.reset();

            assert_eq!(engine.fill(&mut g, 0).unwrap(), FillOutcome::Unchanged);
            assert_eq!(g.snapshot(), before, "{strategy}");
            assert!(sink.is_empty(), "{strategy} touched cells at 0%");
        }
    }

    #[test]
    fn straight_activates_prefix() {
        let mut g = grid(19, 4);
        let mut engine = FillEngine::with_seed(FillStrategy::Straight, 0);
        let outcome = engine.fill(&mut g, 50).unwrap();
        assert_eq!(
            outcome,
            FillOutcome::Filled {
                target: 38,
                activated: 38
            }
        );
        assert_eq!(active_ids(&g), (0..38).collect::<Vec<_>>());
        assert_eq!(g.usage().unwrap().percent(), 50);
    }

    #[test]
    fn straight_shrinks_without_clear_pass() {
        let sink = RecordingSink::new();
        let mut g = Grid::new(sink.clone());
        g.build(10, 1).unwrap();
        let mut engine = FillEngine::with_seed(FillStrategy::Straight, 0);
        engine.fill(&mut g, 80).unwrap();
        sink.reset();
        engine.fill(&mut g, 30).unwrap();
        assert_eq!(active_ids(&g), vec![0, 1, 2]);
        // One write per cell: no separate clear sweep.
        assert_eq!(sink.len(), 10);
    }

    #[test]
    fn full_value_activates_everything() {
        for strategy in FillStrategy::ALL {
            let mut g = grid(7, 3);
            let mut engine = FillEngine::with_seed(strategy, 3);
            engine.fill(&mut g, 100).unwrap();
            assert_eq!(g.active_count(), 21, "{strategy}");
            assert_eq!(g.usage().unwrap().percent(), 100);
        }
    }

    #[test]
    fn random_count_is_exact() {
        let mut g = grid(19, 4);
        let mut engine = FillEngine::with_seed(FillStrategy::Random, 42);
        for value in [1, 13, 50, 77, 99] {
            engine.fill(&mut g, value).unwrap();
            assert_eq!(g.active_count(), target_count(76, value as u8));
        }
    }

    #[test]
    fn random_is_reproducible_per_seed() {
        let run = |seed| {
            let mut g = grid(19, 4);
            FillEngine::with_seed(FillStrategy::Random, seed)
                .fill(&mut g, 40)
                .unwrap();
            g.snapshot()
        };
        assert_eq!(run(11), run(11));
        assert_ne!(run(11), run(12));
    }

    #[test]
    fn bars_fill_columns_top_down() {
        let mut g = grid(19, 4);
        let mut engine = FillEngine::with_seed(FillStrategy::Bars, 0);
        engine.fill(&mut g, 25).unwrap();
        assert_eq!(g.active_count(), 19);
        for cell in g.cells() {
            let expected = cell.column < 4 || (cell.column == 4 && cell.row < 3);
            assert_eq!(cell.active, expected, "cell {cell:?}");
        }
    }

    #[test]
    fn bars_reverse_mirrors_from_the_right() {
        let mut g = grid(19, 4);
        let mut engine = FillEngine::with_seed(FillStrategy::BarsReverse, 0);
        engine.fill(&mut g, 25).unwrap();
        assert_eq!(g.active_count(), 19);
        for cell in g.cells() {
            let expected = cell.column > 14 || (cell.column == 14 && cell.row < 3);
            assert_eq!(cell.active, expected, "cell {cell:?}");
        }
    }

    #[test]
    fn deterministic_strategies_are_idempotent() {
        for strategy in [
            FillStrategy::Straight,
            FillStrategy::Bars,
            FillStrategy::BarsReverse,
        ] {
            let mut g = grid(6, 5);
            let mut engine = FillEngine::with_seed(strategy, 5);
            engine.fill(&mut g, 63).unwrap();
            let first = g.snapshot();
            engine.fill(&mut g, 63).unwrap();
            assert_eq!(g.snapshot(), first, "{strategy}");
        }
    }

    #[test]
    fn palette_colors_applied() {
        let palette = Palette::new(Rgb::new(10, 20, 30), Rgb::new(1, 2, 3));
        let mut g = Grid::default().with_palette(palette);
        g.build(4, 1).unwrap();
        let mut engine = FillEngine::with_seed(FillStrategy::Straight, 0);
        engine.fill(&mut g, 50).unwrap();
        let colors: Vec<Rgb> = g.cells().iter().map(|c| c.color).collect();
        assert_eq!(
            colors,
            vec![palette.on, palette.on, palette.off, palette.off]
        );
    }

    #[test]
    fn randomized_colors_are_not_palette_bound() {
        for strategy in FillStrategy::ALL {
            let mut g = grid(10, 10);
            let mut engine = FillEngine::with_seed(strategy, 77).with_randomize_colors(true);
            engine.fill(&mut g, 100).unwrap();
            let distinct: std::collections::HashSet<u32> =
                g.cells().iter().map(|c| c.color.as_key()).collect();
            assert!(distinct.len() > 10, "{strategy}: {} colors", distinct.len());
        }
    }

    #[test]
    fn every_strategy_paints_with_the_palette() {
        let palette = Palette::new(Rgb::new(10, 20, 30), Rgb::new(1, 2, 3));
        for strategy in FillStrategy::ALL {
            let mut g = Grid::default().with_palette(palette);
            g.build(5, 4).unwrap();
            FillEngine::with_seed(strategy, 5).fill(&mut g, 50).unwrap();
            for cell in g.cells() {
                assert_eq!(cell.color, palette.color_for(cell.active), "{strategy}");
            }
        }
    }

    #[test]
    fn request_captures_settings() {
        let mut engine = FillEngine::with_seed(FillStrategy::Bars, 0);
        engine.set_randomize_colors(true);
        engine.set_strategy(FillStrategy::Straight);
        let req = engine.request(12).unwrap();
        assert_eq!(req.strategy, FillStrategy::Straight);
        assert!(req.randomize_colors);
        assert_eq!(req.value, 12);
    }

    #[test]
    fn apply_rejects_forged_request() {
        let mut g = grid(2, 2);
        let mut engine = FillEngine::with_seed(FillStrategy::Straight, 0);
        let forged = FillRequest {
            strategy: FillStrategy::Straight,
            value: 200,
            randomize_colors: false,
        };
        assert!(engine.apply(&mut g, forged).is_err());
        assert_eq!(g.active_count(), 0);
    }
}
