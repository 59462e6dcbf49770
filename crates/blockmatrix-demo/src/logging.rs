#![forbid(unsafe_code)]

//! Tracing subscriber setup for the demo binary.
//!
//! Logs go to stderr so they never mix with the matrix drawn on stdout.
//! `RUST_LOG` selects the filter (default `warn`); `BLOCKMATRIX_LOG_JSON=1`
//! switches to JSON lines.

use std::env;
use std::io;

use tracing_subscriber::EnvFilter;

pub const ENV_LOG_JSON: &str = "BLOCKMATRIX_LOG_JSON";

fn json_requested() -> bool {
    env::var(ENV_LOG_JSON)
        .map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    let _ = if json_requested() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
