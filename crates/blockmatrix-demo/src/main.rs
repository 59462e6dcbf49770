#![forbid(unsafe_code)]

//! BlockMatrix terminal demo.
//!
//! ```text
//! blockmatrix-demo activity [seconds]   randomized activity animation
//! blockmatrix-demo progress             sweep 0..=100 % with the fill strategy
//! ```
//!
//! Grid size, strategy, colors, off bias, interval, and seed come from the
//! `BLOCKMATRIX_*` environment variables (see `blockmatrix_core::config`).

mod logging;
mod terminal;

use std::env;
use std::error::Error;
use std::io;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use blockmatrix_core::MatrixConfig;
use blockmatrix_runtime::{ActivityAnimator, BlockMatrix};
use tracing::{error, info, warn};

use crate::terminal::{TerminalSession, TerminalSink, footer_line, write_status};

const USAGE: &str = "usage: blockmatrix-demo <activity [seconds] | progress>";
const DEFAULT_ACTIVITY_SECS: u64 = 5;
const PROGRESS_STEP: i64 = 5;
const PROGRESS_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Activity { duration: Duration },
    Progress,
}

impl Mode {
    fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            Some("activity") | None => {
                let secs = match args.next() {
                    Some(raw) => raw
                        .parse::<u64>()
                        .map_err(|_| format!("invalid duration {raw:?}"))?,
                    None => DEFAULT_ACTIVITY_SECS,
                };
                Ok(Self::Activity {
                    duration: Duration::from_secs(secs),
                })
            }
            Some("progress") => Ok(Self::Progress),
            Some(other) => Err(format!("unknown mode {other:?}")),
        }
    }
}

fn main() -> ExitCode {
    logging::init();

    let mode = match Mode::from_args(env::args().skip(1)) {
        Ok(mode) => mode,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let parse = MatrixConfig::from_env_with_diagnostics();
    for err in &parse.errors {
        warn!(%err, "ignoring invalid environment setting");
    }

    match run(mode, parse.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "demo failed");
            eprintln!("blockmatrix-demo: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(mode: Mode, config: MatrixConfig) -> Result<(), Box<dyn Error>> {
    info!(config = %config.summary_short(), ?mode, "starting demo");
    let _session = TerminalSession::enter()?;
    let matrix = BlockMatrix::with_config(config.clone(), TerminalSink::new(io::stdout()))?;
    let status_line = footer_line(config.rows);

    match mode {
        Mode::Activity { duration } => {
            matrix.build_default()?;
            let mut animator = ActivityAnimator::from_config(matrix.clone(), &config)?;
            animator.start()?;
            let started = Instant::now();
            while started.elapsed() < duration {
                thread::sleep(config.interval);
                show_status(&matrix, status_line, "activity")?;
            }
            animator.stop();
        }
        Mode::Progress => {
            // Issued before the grid exists: exercises the deferred path.
            matrix.set_value(PROGRESS_STEP)?;
            matrix.build_default()?;
            show_status(&matrix, status_line, config.strategy.as_str())?;
            for value in (PROGRESS_STEP..=100).step_by(PROGRESS_STEP as usize) {
                thread::sleep(PROGRESS_DELAY);
                matrix.set_value(value)?;
                show_status(&matrix, status_line, config.strategy.as_str())?;
            }
            thread::sleep(PROGRESS_DELAY * 4);
        }
    }
    Ok(())
}

/// Print the usage label below the matrix while holding the mutation gate,
/// so the text never lands between a cell's cursor move and its paint.
fn show_status(matrix: &BlockMatrix, line: u16, label: &str) -> io::Result<()> {
    matrix.with_grid(|grid| {
        let usage = grid
            .usage()
            .map(|u| u.label())
            .unwrap_or_else(|_| "-- %".to_string());
        write_status(&mut io::stdout(), line, &format!("{label}: {usage}"))
    })
}
