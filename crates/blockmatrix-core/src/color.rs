#![forbid(unsafe_code)]

//! Cell colors and the on/off palette.

use std::fmt;

use rand::Rng;

/// RGB color (opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into `0xRRGGBB`.
    #[must_use]
    pub const fn as_key(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Draw a color with each channel uniform in `0..255`.
    ///
    /// The upper bound is exclusive, so 255 never appears in a channel.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(
            rng.random_range(0..255),
            rng.random_range(0..255),
            rng.random_range(0..255),
        )
    }

    /// Parse `#rrggbb` or `rrggbb`.
    #[must_use]
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Colors used for active and inactive cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub on: Rgb,
    pub off: Rgb,
}

impl Palette {
    pub const DEFAULT_ON: Rgb = Rgb::new(28, 166, 0);
    pub const DEFAULT_OFF: Rgb = Rgb::new(200, 210, 220);

    #[must_use]
    pub const fn new(on: Rgb, off: Rgb) -> Self {
        Self { on, off }
    }

    /// Color for a cell in the given state.
    #[must_use]
    pub const fn color_for(self, active: bool) -> Rgb {
        if active { self.on } else { self.off }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ON, Self::DEFAULT_OFF)
    }
}
