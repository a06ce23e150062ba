//! # Invoice Numbering
//!
//! Pure rules for building and advancing invoice numbers.
//!
//! ## Number Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     INV-ADH20240315001                                  │
//! │                                                                         │
//! │     INV-    ADH      2024    03     15      001                         │
//! │     ────    ───      ────    ──     ──      ───                         │
//! │    prefix  factory   year   month  day   sequence                       │
//! │             code                                                        │
//! │                                                                         │
//! │  The sequence counts per (factory, year, month): the lookup prefix      │
//! │  is INV-ADH202403, so invoices on different days of the same month      │
//! │  share one counter.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database half of the rule (finding the latest number for a month)
//! lives in the repository layer; everything here is deterministic string
//! work so it can be tested without a store.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Prefix shared by all generated invoice numbers.
pub const NUMBER_PREFIX: &str = "INV-";

/// Width of the zero-padded sequence suffix.
pub const SEQUENCE_DIGITS: usize = 3;

/// First sequence value for a fresh (factory, year, month).
pub const SEQUENCE_START: u32 = 1;

/// Builds the lookup prefix matching every invoice of one factory-month.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use factura_core::numbering::month_prefix;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(month_prefix("ADH", date), "INV-ADH202403");
/// ```
pub fn month_prefix(factory_code: &str, date: NaiveDate) -> String {
    format!(
        "{}{}{:04}{:02}",
        NUMBER_PREFIX,
        factory_code,
        date.year(),
        date.month()
    )
}

/// Formats a complete invoice number from its parts.
///
/// The day of month sits between the month and the sequence; it is cosmetic
/// and plays no part in sequence matching (see [`month_prefix`]).
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use factura_core::numbering::format_number;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(format_number("ADH", date, 1), "INV-ADH20240315001");
/// ```
pub fn format_number(factory_code: &str, date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}{:02}{:03$}",
        month_prefix(factory_code, date),
        date.day(),
        sequence,
        SEQUENCE_DIGITS
    )
}

/// Parses the trailing sequence digits of an existing invoice number and
/// returns the next value.
///
/// Returns `None` when the number is too short or its suffix is not numeric;
/// the caller treats that as a degraded case and falls back to
/// [`fallback_number`].
pub fn next_sequence(last_number: &str) -> Option<u32> {
    let len = last_number.len();
    if len < SEQUENCE_DIGITS {
        return None;
    }
    let suffix = last_number.get(len - SEQUENCE_DIGITS..)?;
    let current: u32 = suffix.parse().ok()?;
    Some(current + 1)
}

/// Guaranteed-unique but non-human-friendly number for the degraded path.
///
/// Used when the sequenced rule cannot produce a number (query failure,
/// malformed prior number, exhausted uniqueness retries). Never surfaced
/// as an error: invoice creation must not be blocked by numbering.
pub fn fallback_number(now: DateTime<Utc>) -> String {
    format!("{}{}", NUMBER_PREFIX, now.timestamp_millis())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_prefix() {
        assert_eq!(month_prefix("ADH", date(2024, 3, 15)), "INV-ADH202403");
        assert_eq!(month_prefix("TEX", date(2023, 12, 1)), "INV-TEX202312");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("ADH", date(2024, 3, 15), 1), "INV-ADH20240315001");
        assert_eq!(format_number("ADH", date(2024, 3, 15), 2), "INV-ADH20240315002");
        assert_eq!(format_number("ADH", date(2024, 3, 7), 45), "INV-ADH20240307045");
    }

    #[test]
    fn test_single_digit_month_is_zero_padded() {
        assert_eq!(format_number("ADH", date(2024, 1, 5), 1), "INV-ADH20240105001");
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence("INV-ADH20240315001"), Some(2));
        assert_eq!(next_sequence("INV-ADH20240315099"), Some(100));
        assert_eq!(next_sequence("INV-ADH20240331998"), Some(999));
    }

    #[test]
    fn test_next_sequence_ignores_day_component() {
        // Latest invoice was on the 15th; a new invoice on the 20th still
        // continues the month counter.
        let next = next_sequence("INV-ADH20240315002").unwrap();
        assert_eq!(format_number("ADH", date(2024, 3, 20), next), "INV-ADH20240320003");
    }

    #[test]
    fn test_next_sequence_rejects_malformed_numbers() {
        assert_eq!(next_sequence(""), None);
        assert_eq!(next_sequence("IN"), None);
        assert_eq!(next_sequence("INV-ADH20240315XYZ"), None);
    }

    #[test]
    fn test_fallback_number() {
        let now = DateTime::from_timestamp_millis(1_710_500_000_000).unwrap();
        assert_eq!(fallback_number(now), "INV-1710500000000");
    }
}
