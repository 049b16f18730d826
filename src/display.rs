// ABOUTME: Text formatting for timestamps and progress in console output

use chrono::NaiveDateTime;

pub const PLACEHOLDER: &str = "-";

/// `Jan 5, 2025, 3:07 PM`, or `-` when absent.
pub fn format_timestamp(value: Option<NaiveDateTime>) -> String {
    match value {
        Some(ts) => ts.format("%b %-d, %Y, %-I:%M %p").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// `January 5, 2025, 3:07 PM`, for schedule summaries. Empty when absent.
pub fn format_long_date(value: Option<NaiveDateTime>) -> String {
    match value {
        Some(ts) => ts.format("%B %-d, %Y, %-I:%M %p").to_string(),
        None => String::new(),
    }
}

pub fn format_percent(value: Option<u8>) -> String {
    match value {
        Some(p) => format!("{}%", p),
        None => PLACEHOLDER.to_string(),
    }
}
