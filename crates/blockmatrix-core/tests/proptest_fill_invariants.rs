//! Property-based invariant tests for the fill engine and usage metric.
//!
//! 1. Fresh grids have `columns * rows` inactive cells with row-major ids.
//! 2. Every strategy activates exactly `floor(n * v / 100)` cells for v > 0.
//! 3. Straight activates precisely the build-order prefix.
//! 4. Bars fills `k` whole leftmost columns plus the top of column `k`.
//! 5. BarsReverse mirrors Bars from the rightmost column.
//! 6. A value of 0 never changes the pattern.
//! 7. Usage equals the half-up rounded percentage of active cells.
//! 8. Out-of-range values are rejected without mutation.

use blockmatrix_core::{FillEngine, FillStrategy, Grid, Usage, target_count};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn dims() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=24, 1usize..=8)
}

fn fill_strategy() -> impl Strategy<Value = FillStrategy> {
    prop::sample::select(FillStrategy::ALL.to_vec())
}

fn built(columns: usize, rows: usize) -> Grid {
    let mut grid = Grid::default();
    grid.build(columns, rows).unwrap();
    grid
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn fresh_grid_shape((columns, rows) in (0usize..=30, 0usize..=10)) {
        let grid = built(columns, rows);
        prop_assert_eq!(grid.len(), columns * rows);
        for (index, cell) in grid.cells().iter().enumerate() {
            prop_assert_eq!(cell.id, index);
            prop_assert_eq!(cell.column, index % columns);
            prop_assert_eq!(cell.row, index / columns);
            prop_assert!(!cell.active);
        }
    }

    #[test]
    fn count_is_exact(
        (columns, rows) in dims(),
        strategy in fill_strategy(),
        value in 1i64..=100,
        seed in any::<u64>(),
    ) {
        let mut grid = built(columns, rows);
        let mut engine = FillEngine::with_seed(strategy, seed);
        engine.fill(&mut grid, value).unwrap();
        prop_assert_eq!(grid.active_count(), target_count(columns * rows, value as u8));
    }

    #[test]
    fn straight_is_prefix((columns, rows) in dims(), value in 1i64..=100) {
        let mut grid = built(columns, rows);
        FillEngine::with_seed(FillStrategy::Straight, 0).fill(&mut grid, value).unwrap();
        let count = target_count(grid.len(), value as u8);
        for cell in grid.cells() {
            prop_assert_eq!(cell.active, cell.id < count);
        }
    }

    #[test]
    fn bars_fill_whole_columns((columns, rows) in dims(), value in 1i64..=100) {
        let mut grid = built(columns, rows);
        FillEngine::with_seed(FillStrategy::Bars, 0).fill(&mut grid, value).unwrap();
        let count = target_count(grid.len(), value as u8);
        let full = count / rows;
        let partial = count % rows;
        for cell in grid.cells() {
            let expected = cell.column < full || (cell.column == full && cell.row < partial);
            prop_assert_eq!(cell.active, expected);
        }
    }

    #[test]
    fn bars_reverse_mirrors_bars((columns, rows) in dims(), value in 1i64..=100) {
        let mut forward = built(columns, rows);
        let mut reverse = built(columns, rows);
        FillEngine::with_seed(FillStrategy::Bars, 0).fill(&mut forward, value).unwrap();
        FillEngine::with_seed(FillStrategy::BarsReverse, 0).fill(&mut reverse, value).unwrap();
        for cell in reverse.cells() {
            let mirrored = cell.row * columns + (columns - 1 - cell.column);
            prop_assert_eq!(cell.active, forward.cells()[mirrored].active);
        }
    }

    #[test]
    fn zero_is_a_no_op(
        (columns, rows) in dims(),
        strategy in fill_strategy(),
        value in 1i64..=100,
        seed in any::<u64>(),
    ) {
        let mut grid = built(columns, rows);
        let mut engine = FillEngine::with_seed(strategy, seed);
        engine.fill(&mut grid, value).unwrap();
        let before = grid.snapshot();
        engine.fill(&mut grid, 0).unwrap();
        prop_assert_eq!(grid.snapshot(), before);
    }

    #[test]
    fn usage_rounds_half_up(total in 1usize..=10_000, share in 0.0f64..=1.0) {
        let active = ((total as f64) * share) as usize;
        let usage = Usage::from_counts(active, total).unwrap();
        let expected = (active as f64 * 100.0 / total as f64 + 0.5).floor() as u8;
        prop_assert_eq!(usage.percent(), expected);
        prop_assert!(usage.percent() <= 100);
    }

    #[test]
    fn out_of_range_rejected(
        (columns, rows) in dims(),
        strategy in fill_strategy(),
        value in prop_oneof![i64::MIN..0i64, 101i64..=i64::MAX],
    ) {
        let mut grid = built(columns, rows);
        let mut engine = FillEngine::with_seed(strategy, 1);
        prop_assert!(engine.fill(&mut grid, value).unwrap_err().is_invalid_configuration());
        prop_assert_eq!(grid.active_count(), 0);
    }
}
