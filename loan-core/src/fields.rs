//! Raw-input coercion helpers.
//!
//! Everything the wizard collects arrives as text. These helpers apply the
//! coercion rules used when assembling a submission: trim first, then parse,
//! and treat anything unparseable as absent rather than as a junk value.

use rust_decimal::Decimal;

/// Trims a raw input value, returning `None` when nothing remains.
///
/// A field left blank is absent, not an empty string.
pub fn clean(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes input for decimal parsing: trims whitespace and removes commas
/// (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into an optional [`Decimal`].
///
/// Handles comma as thousands separator. Returns `None` for empty or
/// whitespace-only input, or when parsing fails (logs a warning on parse
/// failure). A failed parse never produces a not-a-number value.
pub fn parse_optional_decimal(s: &str) -> Option<Decimal> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        None
    } else {
        normalized.parse().map_or_else(
            |e| {
                tracing::warn!(input = %s, "invalid optional decimal: {}", e);
                None
            },
            Some,
        )
    }
}

/// Parses a string into an optional non-negative count.
///
/// Same absence rules as [`parse_optional_decimal`].
pub fn parse_optional_count(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        trimmed.parse().map_or_else(
            |e| {
                tracing::warn!(input = %s, "invalid optional count: {}", e);
                None
            },
            Some,
        )
    }
}

/// Interprets a yes/no select value as an optional boolean.
///
/// Only "yes" and "no" (case-insensitive) are recognized; anything else is
/// treated as unanswered.
pub fn parse_yes_no(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}
