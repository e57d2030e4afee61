//! Core functionality for the query result rendering engine
//!
//! This crate provides the record model, column inference, value formatting
//! and the render context shared by the table and chart engines.

pub mod column;
pub mod context;
pub mod events;
pub mod format;
pub mod record;

// Re-export commonly used types
pub use column::{infer_columns, numeric_column_names, Column, ColumnKind};
pub use context::{parse_hex_color, RenderContext, Rgba, DEFAULT_PALETTE, DEFAULT_UNIT_ALIASES};
pub use events::{handler_from_fn, Event, EventBus, EventHandler};
pub use format::{
    coerce_number, detect_unit, format_number, format_value, numeric_for_display, value_sign,
    NumberLocale, ValueFormatter, ValueSign,
};
pub use record::{cell, is_native_number, native_number, raw_text, Record};
