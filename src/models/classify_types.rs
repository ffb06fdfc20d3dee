use crate::models::category::Category;
use serde::{Serialize, Serializer};
use std::fmt;

pub const PLACEHOLDER: &str = "—";
pub const UNKNOWN: &str = "Unknown";
pub const NO_RESULT: &str = "No result";
pub const ERROR: &str = "Error";

/// One entry of an engine result list.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Recognition {
    pub index: u32,
    pub confidence: f32,
}

/// What the result text area shows. Never a raw error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayLabel {
    #[default]
    Placeholder,
    Species(String),
    Unknown,
    NoResult,
    Error,
}

impl DisplayLabel {
    pub fn as_str(&self) -> &str {
        match self {
            DisplayLabel::Placeholder => PLACEHOLDER,
            DisplayLabel::Species(name) => name,
            DisplayLabel::Unknown => UNKNOWN,
            DisplayLabel::NoResult => NO_RESULT,
            DisplayLabel::Error => ERROR,
        }
    }
}

impl fmt::Display for DisplayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DisplayLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ClassifierStatus {
    pub category: Category,
    pub generation: u64,
    pub labels_ready: bool,
    pub label_count: usize,
    pub model_ready: bool,
    pub model_error: Option<String>,
    pub result: DisplayLabel,
    pub image: Option<String>,
}

/// Outcome of one image picker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Cancelled,
    Failed(String),
    Picked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_labels_serialize_as_plain_strings() {
        let labels = vec![
            DisplayLabel::Placeholder,
            DisplayLabel::Species("Lilium".to_string()),
            DisplayLabel::Unknown,
            DisplayLabel::NoResult,
            DisplayLabel::Error,
        ];
        let json = serde_json::to_value(&labels).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["—", "Lilium", "Unknown", "No result", "Error"])
        );
    }
}
