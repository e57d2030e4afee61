//! Utilities for plot and table views

pub mod colors;

// Re-export commonly used items
pub use colors::{sign_color, to_color32, with_alpha, NEGATIVE_COLOR, POSITIVE_COLOR};
