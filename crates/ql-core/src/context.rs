//! Explicit rendering context passed to the formatter and chart engine

use serde::{Deserialize, Serialize};

use crate::format::{detect_unit, NumberLocale, ValueFormatter};
use crate::record::Record;

/// RGBA color
pub type Rgba = [u8; 4];

/// Series palette used when no other is configured
pub const DEFAULT_PALETTE: [Rgba; 5] = [
    [0x3b, 0x82, 0xf6, 0xff], // Blue
    [0x10, 0xb9, 0x81, 0xff], // Green
    [0xef, 0x44, 0x44, 0xff], // Red
    [0xf5, 0x9e, 0x0b, 0xff], // Amber
    [0x63, 0x66, 0xf1, 0xff], // Indigo
];

/// Column names probed for a unit, in priority order
pub const DEFAULT_UNIT_ALIASES: [&str; 4] = ["birim", "para_birim", "currency", "doviz"];

/// Locale, unit aliases and palette for one render pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    pub locale: NumberLocale,
    pub unit_aliases: Vec<String>,
    pub palette: Vec<Rgba>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            locale: NumberLocale::default(),
            unit_aliases: DEFAULT_UNIT_ALIASES.iter().map(|s| s.to_string()).collect(),
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl RenderContext {
    /// Palette color for a series index
    pub fn color(&self, index: usize) -> Rgba {
        if self.palette.is_empty() {
            return DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()];
        }
        self.palette[index % self.palette.len()]
    }

    /// Unit detected on the first record of a batch
    pub fn unit_for(&self, batch: &[Record]) -> Option<String> {
        detect_unit(batch.first(), &self.unit_aliases)
    }

    /// Value formatter for a batch, with its unit already detected
    pub fn formatter_for(&self, batch: &[Record]) -> ValueFormatter {
        ValueFormatter::new(self.locale, self.unit_for(batch))
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`
pub fn parse_hex_color(text: &str) -> Option<Rgba> {
    let hex = text.trim().strip_prefix('#')?;
    if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
        return None;
    }

    let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 0xff };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}
