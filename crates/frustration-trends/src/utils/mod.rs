//! Utilities module - Common utility functions for review text and timestamps

pub mod date_utils;
pub mod text_utils;

// Re-export commonly used utilities
pub use date_utils::{format_timestamp, parse_timestamp, week_start_date};
pub use text_utils::TextUtils;
