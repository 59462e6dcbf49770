#![forbid(unsafe_code)]

//! Matrix configuration with environment overrides.
//!
//! Every knob has a default matching the classic 19×4 widget. Environment
//! variables override defaults one by one; a malformed variable is reported
//! in the diagnostics and the default is kept.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BLOCKMATRIX_COLUMNS` | `columns` |
//! | `BLOCKMATRIX_ROWS` | `rows` |
//! | `BLOCKMATRIX_STRATEGY` | `strategy` |
//! | `BLOCKMATRIX_RANDOM_COLORS` | `randomize_colors` |
//! | `BLOCKMATRIX_OFF_BIAS` | `off_bias` |
//! | `BLOCKMATRIX_INTERVAL_MS` | `interval` |
//! | `BLOCKMATRIX_COLOR_ON` | `palette.on` |
//! | `BLOCKMATRIX_COLOR_OFF` | `palette.off` |
//! | `BLOCKMATRIX_SEED` | `seed` |

use std::env;
use std::fmt;
use std::time::Duration;

use crate::activity::DEFAULT_OFF_BIAS;
use crate::color::{Palette, Rgb};
use crate::error::BlockMatrixError;
use crate::fill::FillStrategy;
use crate::grid::{DEFAULT_COLUMNS, DEFAULT_ROWS};

pub const ENV_COLUMNS: &str = "BLOCKMATRIX_COLUMNS";
pub const ENV_ROWS: &str = "BLOCKMATRIX_ROWS";
pub const ENV_STRATEGY: &str = "BLOCKMATRIX_STRATEGY";
pub const ENV_RANDOM_COLORS: &str = "BLOCKMATRIX_RANDOM_COLORS";
pub const ENV_OFF_BIAS: &str = "BLOCKMATRIX_OFF_BIAS";
pub const ENV_INTERVAL_MS: &str = "BLOCKMATRIX_INTERVAL_MS";
pub const ENV_COLOR_ON: &str = "BLOCKMATRIX_COLOR_ON";
pub const ENV_COLOR_OFF: &str = "BLOCKMATRIX_COLOR_OFF";
pub const ENV_SEED: &str = "BLOCKMATRIX_SEED";

/// Default animator tick period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Full matrix configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixConfig {
    pub columns: usize,
    pub rows: usize,
    pub strategy: FillStrategy,
    pub randomize_colors: bool,
    /// Higher values switch more cells off per animator tick.
    pub off_bias: u8,
    pub interval: Duration,
    pub palette: Palette,
    /// Fixed RNG seed; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            strategy: FillStrategy::default(),
            randomize_colors: false,
            off_bias: DEFAULT_OFF_BIAS,
            interval: DEFAULT_INTERVAL,
            palette: Palette::default(),
            seed: None,
        }
    }
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for BlockMatrixError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfiguration {
            field: err.field,
            value: err.value,
            message: err.message,
        }
    }
}

/// Parsed configuration plus every diagnostic raised while parsing.
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: MatrixConfig,
    pub errors: Vec<ConfigError>,
}

impl MatrixConfig {
    #[must_use]
    pub fn with_size(mut self, columns: usize, rows: usize) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: FillStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_randomize_colors(mut self, enabled: bool) -> Self {
        self.randomize_colors = enabled;
        self
    }

    #[must_use]
    pub fn with_off_bias(mut self, off_bias: u8) -> Self {
        self.off_bias = off_bias;
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> MatrixConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.interval.is_zero() {
            errors.push(ConfigError::new(
                "interval",
                format!("{:?}", self.interval),
                "interval must be positive",
            ));
        }
        if self.columns.checked_mul(self.rows).is_none() {
            errors.push(ConfigError::new(
                "columns*rows",
                format!("{}x{}", self.columns, self.rows),
                "grid size overflows usize",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold the first violation into a [`BlockMatrixError`].
    pub fn check(&self) -> crate::error::Result<()> {
        self.validate().map_err(|mut errors| errors.remove(0).into())
    }

    /// Short human-readable summary for status lines.
    #[must_use]
    pub fn summary_short(&self) -> String {
        format!(
            "{}x{} · {} · bias {:#04x} · {}ms",
            self.columns,
            self.rows,
            self.strategy,
            self.off_bias,
            self.interval.as_millis()
        )
    }
}

fn from_env_with<F>(mut get: F) -> ConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = MatrixConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_COLUMNS) {
        match parse_usize(&value) {
            Some(parsed) => config.columns = parsed,
            None => errors.push(ConfigError::new(
                "columns",
                value,
                "expected non-negative integer",
            )),
        }
    }

    if let Some(value) = get(ENV_ROWS) {
        match parse_usize(&value) {
            Some(parsed) => config.rows = parsed,
            None => errors.push(ConfigError::new(
                "rows",
                value,
                "expected non-negative integer",
            )),
        }
    }

    if let Some(value) = get(ENV_STRATEGY) {
        match FillStrategy::parse(&value) {
            Some(parsed) => config.strategy = parsed,
            None => errors.push(ConfigError::new(
                "strategy",
                value,
                "expected random|straight|bars|bars-reverse",
            )),
        }
    }

    if let Some(value) = get(ENV_RANDOM_COLORS) {
        match parse_bool(&value) {
            Some(parsed) => config.randomize_colors = parsed,
            None => errors.push(ConfigError::new(
                "randomize_colors",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Some(value) = get(ENV_OFF_BIAS) {
        match parse_int(&value).and_then(|v| u8::try_from(v).ok()) {
            Some(parsed) => config.off_bias = parsed,
            None => errors.push(ConfigError::new(
                "off_bias",
                value,
                "expected integer in 0..=255",
            )),
        }
    }

    if let Some(value) = get(ENV_INTERVAL_MS) {
        match parse_usize(&value).filter(|&ms| ms > 0) {
            Some(ms) => config.interval = Duration::from_millis(ms as u64),
            None => errors.push(ConfigError::new(
                "interval",
                value,
                "expected positive integer (milliseconds)",
            )),
        }
    }

    if let Some(value) = get(ENV_COLOR_ON) {
        match Rgb::parse_hex(&value) {
            Some(parsed) => config.palette.on = parsed,
            None => errors.push(ConfigError::new("color_on", value, "expected #rrggbb")),
        }
    }

    if let Some(value) = get(ENV_COLOR_OFF) {
        match Rgb::parse_hex(&value) {
            Some(parsed) => config.palette.off = parsed,
            None => errors.push(ConfigError::new("color_off", value, "expected #rrggbb")),
        }
    }

    if let Some(value) = get(ENV_SEED) {
        match value.trim().parse::<u64>() {
            Ok(parsed) => config.seed = Some(parsed),
            Err(_) => errors.push(ConfigError::new("seed", value, "expected u64")),
        }
    }

    if let Err(mut violations) = config.validate() {
        if violations.iter().any(|v| v.field == "columns*rows") {
            config.columns = DEFAULT_COLUMNS;
            config.rows = DEFAULT_ROWS;
        }
        errors.append(&mut violations);
    }

    ConfigParse { config, errors }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

/// Decimal or `0x`-prefixed hexadecimal.
fn parse_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse::<i64>().ok(),
    }
}
