//! Lenient cell parsing for bank exports.

use chrono::{NaiveDate, NaiveDateTime};

/// Day-first formats seen in Indian bank exports, tried in order
const DATE_FORMATS: [&str; 10] = [
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d-%b-%y",
    "%d %B %Y",
    "%Y-%m-%d",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Parse a money cell: `"1,000.50"`, `"₹800"`, `" 12 "`. Blank means zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return if raw.trim().is_empty() || raw.trim() == "-" { Some(0.0) } else { None };
    }
    if cleaned == "-" {
        return Some(0.0);
    }
    cleaned.parse().ok()
}

/// Parse a date cell, day first.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}
