//! Per-row annotations produced by the processing stages.
//!
//! Annotations are always total: every field has a value even when the
//! model call behind it failed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used when a row cannot be categorized
pub const UNCLEAR: &str = "Unclear";

/// Placeholder note written when the model had no doubts
pub const NO_DOUBTS: &str = "—";

/// How sure the model was about a categorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl Confidence {
    /// Snap a free-text label to a confidence level.
    /// Anything other than high/medium/low (any case) collapses to `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the remark normalization stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RemarkAnnotation {
    /// Short natural-language reading of the raw remark
    pub cleaned_remark: String,
    /// Uncertainty note from the model, `—` when it had none
    pub notes: String,
}

impl RemarkAnnotation {
    pub fn new(cleaned_remark: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            cleaned_remark: cleaned_remark.into(),
            notes: notes.into(),
        }
    }
}

/// Output of the categorization stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryAnnotation {
    /// Free-form category label, discovered by the model
    pub category: String,
    /// More specific label; the model may omit it
    pub subcategory: Option<String>,
    pub confidence: Confidence,
}

impl CategoryAnnotation {
    pub fn new(category: impl Into<String>, subcategory: Option<String>, confidence: Confidence) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.filter(|s| !s.trim().is_empty()),
            confidence,
        }
    }

    /// The "Unclear" / Low annotation used for blank rows and failures
    pub fn unclear() -> Self {
        Self::new(UNCLEAR, None, Confidence::Low)
    }

    pub fn is_unclear(&self) -> bool {
        self.category == UNCLEAR
    }

    pub fn subcategory_str(&self) -> &str {
        self.subcategory.as_deref().unwrap_or("")
    }
}

impl Default for CategoryAnnotation {
    fn default() -> Self {
        Self::unclear()
    }
}
