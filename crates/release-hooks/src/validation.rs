//! Validation report accumulation for plugin configuration.

use serde::{Deserialize, Serialize};

/// A single invalid configuration field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Configuration field path (e.g., "release_issue.priority").
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

/// Validation result returned to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// True when no field errors were recorded.
    pub valid: bool,
    /// Field errors, in the order they were recorded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// Accumulates field errors and builds a [`ValidationResponse`].
#[derive(Debug, Default)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invalid field.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Whether any errors have been recorded so far.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn build(self) -> ValidationResponse {
        ValidationResponse {
            valid: self.errors.is_empty(),
            errors: self.errors,
        }
    }
}
