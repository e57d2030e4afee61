//! Color utilities for plots and tables

use egui::Color32;
use ql_core::{Rgba, ValueSign};

/// Negative numbers in tables
pub const NEGATIVE_COLOR: Color32 = Color32::from_rgb(220, 38, 38);

/// Positive numbers in tables
pub const POSITIVE_COLOR: Color32 = Color32::from_rgb(22, 163, 74);

/// Convert a palette entry to an egui color
pub fn to_color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3])
}

/// Same color with a different alpha, for fills
pub fn with_alpha(color: Rgba, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color[0], color[1], color[2], alpha)
}

/// Text color for a table cell, if its sign calls for one
pub fn sign_color(sign: ValueSign) -> Option<Color32> {
    match sign {
        ValueSign::Negative => Some(NEGATIVE_COLOR),
        ValueSign::Positive => Some(POSITIVE_COLOR),
        ValueSign::Zero | ValueSign::NotNumeric => None,
    }
}
