//! Release context supplied by the host.

use serde::{Deserialize, Serialize};

/// Read-only description of the release being processed.
///
/// Supplied whole by the host on every invocation; plugins never
/// mutate it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseContext {
    /// Version being released (e.g., "1.4.0").
    #[serde(default)]
    pub version: String,
    /// Git tag name (e.g., "v1.4.0").
    #[serde(default)]
    pub tag_name: String,
    /// Branch the release was cut from.
    #[serde(default)]
    pub branch: String,
    /// Release type (major, minor, patch).
    #[serde(default)]
    pub release_type: String,
    /// Rendered release notes.
    #[serde(default)]
    pub release_notes: String,
    /// Commit SHA the release points at.
    #[serde(default)]
    pub commit_sha: String,
    /// Categorized commits included in the release.
    #[serde(default)]
    pub changes: Option<Changes>,
}

impl ReleaseContext {
    /// Commit descriptions across all change buckets, in fixed order:
    /// features, fixes, breaking changes, other.
    #[must_use]
    pub fn commit_descriptions(&self) -> Vec<String> {
        self.changes
            .as_ref()
            .map(|changes| changes.descriptions().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

/// Commits grouped by change category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changes {
    /// New features.
    #[serde(default)]
    pub features: Vec<CommitInfo>,
    /// Bug fixes.
    #[serde(default)]
    pub fixes: Vec<CommitInfo>,
    /// Breaking changes.
    #[serde(default)]
    pub breaking: Vec<CommitInfo>,
    /// Everything else.
    #[serde(default)]
    pub other: Vec<CommitInfo>,
}

impl Changes {
    /// Commit descriptions in fixed bucket order.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .chain(&self.fixes)
            .chain(&self.breaking)
            .chain(&self.other)
            .map(|commit| commit.description.as_str())
    }
}

/// A single commit as the host categorized it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit SHA.
    #[serde(default)]
    pub sha: String,
    /// Commit description (subject line, conventional-commit style).
    pub description: String,
    /// Conventional-commit scope, if any.
    #[serde(default)]
    pub scope: Option<String>,
}
