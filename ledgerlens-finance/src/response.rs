//! Parsing of free-text model replies.
//!
//! Two stages, both typed:
//! 1. locate a JSON object in the reply (models like to add commentary),
//!    parse it and validate each field against its default;
//! 2. if no object can be recovered, fall back to a keyword scan of the raw
//!    reply.

use ledgerlens_core::{CategoryAnnotation, Confidence, RemarkAnnotation, NO_DOUBTS, UNCLEAR};
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Keyword groups for the degraded path, checked in order
const FALLBACK_KEYWORDS: &[(&str, &[&str])] = &[
    ("Fuel", &["fuel", "petrol", "diesel"]),
    ("Food", &["grocery", "food", "restaurant"]),
    ("Refund", &["refund", "reversal"]),
];

/// Longest raw reply kept as a cleaned remark when no JSON came back
const RAW_REMARK_LIMIT: usize = 200;

/// Note attached when the remark reply carried no usable JSON
pub const UNPARSED_NOTE: &str = "Unparsed model response";

#[derive(Debug, Error, PartialEq)]
pub enum ParseFailure {
    #[error("no JSON object in response")]
    NoJson,

    #[error("invalid JSON: {0}")]
    Invalid(String),

    #[error("JSON value is not an object")]
    NotAnObject,
}

/// Find and parse the JSON object in `text`.
///
/// Flat `{...}` spans mentioning `key` are tried first, then the widest
/// `{...}` span in the reply.
pub fn extract_object(text: &str, key: &str) -> Result<Map<String, Value>, ParseFailure> {
    let flat = Regex::new(r"\{[^{}]*\}").map_err(|e| ParseFailure::Invalid(e.to_string()))?;
    let quoted_key = format!("\"{key}\"");

    for m in flat.find_iter(text) {
        if !m.as_str().contains(&quoted_key) {
            continue;
        }
        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(m.as_str()) {
            return Ok(obj);
        }
    }

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(ParseFailure::NoJson);
    };
    if end < start {
        return Err(ParseFailure::NoJson);
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(_) => Err(ParseFailure::NotAnObject),
        Err(e) => Err(ParseFailure::Invalid(e.to_string())),
    }
}

/// A trimmed, non-empty string field; `None` if missing, empty or not a string
fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub fn structured_category(text: &str) -> Result<CategoryAnnotation, ParseFailure> {
    let obj = extract_object(text, "category")?;

    let category = string_field(&obj, "category").unwrap_or_else(|| UNCLEAR.to_string());
    let subcategory = string_field(&obj, "subcategory");
    let confidence = string_field(&obj, "confidence")
        .map(|c| Confidence::from_label(&c))
        .unwrap_or(Confidence::Low);

    Ok(CategoryAnnotation::new(category, subcategory, confidence))
}

/// Best-guess category from keywords in the raw reply, always Low
pub fn keyword_category(text: &str) -> CategoryAnnotation {
    let lower = text.to_lowercase();
    let category = FALLBACK_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(label, _)| *label)
        .unwrap_or(UNCLEAR);
    CategoryAnnotation::new(category, None, Confidence::Low)
}

pub fn parse_category_response(text: &str) -> CategoryAnnotation {
    structured_category(text).unwrap_or_else(|failure| {
        tracing::debug!(%failure, "category reply not structured, using keyword fallback");
        keyword_category(text)
    })
}

/// Collapse "no doubt" markers to the dash placeholder
fn normalize_note(note: Option<String>) -> String {
    match note {
        Some(n) if !matches!(n.to_lowercase().as_str(), "—" | "-" | "none" | "null" | "n/a") => n,
        _ => NO_DOUBTS.to_string(),
    }
}

pub fn structured_remark(text: &str) -> Result<RemarkAnnotation, ParseFailure> {
    let obj = extract_object(text, "cleaned_remark")?;
    let cleaned = string_field(&obj, "cleaned_remark").unwrap_or_default();
    let notes = normalize_note(string_field(&obj, "notes_doubts"));
    Ok(RemarkAnnotation::new(cleaned, notes))
}

pub fn parse_remark_response(text: &str) -> RemarkAnnotation {
    structured_remark(text).unwrap_or_else(|failure| {
        tracing::debug!(%failure, "remark reply not structured, keeping raw text");
        let raw: String = text.trim().chars().take(RAW_REMARK_LIMIT).collect();
        RemarkAnnotation::new(raw, UNPARSED_NOTE)
    })
}
