use serde::Serialize;

use crate::config::{StatusLabel, StatusLabels};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusResult {
    NotPresent,
    PresentNoVariant,
    PresentWithVariant,
}

impl StatusResult {
    pub fn from_queries(has_variant: bool, has_bare: bool) -> Self {
        match (has_variant, has_bare) {
            (true, _) => StatusResult::PresentWithVariant,
            (false, true) => StatusResult::PresentNoVariant,
            (false, false) => StatusResult::NotPresent,
        }
    }

    pub fn has_local(self) -> bool {
        !matches!(self, StatusResult::NotPresent)
    }

    pub fn has_variant(self) -> bool {
        matches!(self, StatusResult::PresentWithVariant)
    }

    // Codes that still need attention get an anchor and a summary row.
    pub fn is_promoted(self) -> bool {
        !self.has_variant()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusResult::NotPresent => "not_present",
            StatusResult::PresentNoVariant => "present_no_variant",
            StatusResult::PresentWithVariant => "present_with_variant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationStyle {
    prefix: String,
    labels: StatusLabels,
}

impl AnnotationStyle {
    pub fn new(prefix: &str, labels: &StatusLabels) -> Self {
        Self {
            prefix: prefix.to_string(),
            labels: labels.clone(),
        }
    }

    pub fn label(&self, status: StatusResult) -> &StatusLabel {
        match status {
            StatusResult::PresentWithVariant => &self.labels.present_with_variant,
            StatusResult::PresentNoVariant => &self.labels.present_no_variant,
            StatusResult::NotPresent => &self.labels.not_present,
        }
    }

    pub fn render(&self, status: StatusResult) -> String {
        let label = self.label(status);
        format!(
            "{}<span style=\"color: {}; font-weight: bold;\">{}</span>",
            self.prefix, label.color, label.text
        )
    }
}
