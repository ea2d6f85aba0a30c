//! Linear entity type definitions.
//!
//! Reduced to the fields release automation actually fetches.

use serde::{Deserialize, Serialize};

/// Linear issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier (internal id; mutations key on this).
    pub id: String,
    /// Human-readable identifier (e.g., "ENG-123").
    pub identifier: String,
    /// Issue title.
    pub title: String,
    /// URL to the issue.
    #[serde(default)]
    pub url: Option<String>,
    /// Current workflow state.
    #[serde(default)]
    pub state: Option<WorkflowState>,
}

/// Linear workflow state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    /// Unique identifier.
    pub id: String,
    /// State name (e.g., "Done").
    pub name: String,
    /// State type: backlog, unstarted, started, completed, canceled.
    #[serde(rename = "type")]
    pub state_type: String,
}

/// Linear team with its workflow states.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Unique identifier.
    pub id: String,
    /// Team key (the prefix in issue identifiers).
    pub key: String,
    /// Team name.
    pub name: String,
    /// Workflow states, in team order.
    #[serde(default)]
    pub states: Vec<WorkflowState>,
}

/// The authenticated user, used only as a credential probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// How a team is addressed: internal id or human key.
///
/// Id lookups query the team directly; key lookups scan the teams
/// collection and match the key exactly (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamLookup {
    /// Internal team id.
    Id(String),
    /// Human team key (e.g., "ENG").
    Key(String),
}

/// Input for creating an issue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueInput {
    /// Team ID.
    pub team_id: String,
    /// Issue title.
    pub title: String,
    /// Issue description (markdown).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority (0 = none, 1 = urgent .. 4 = low).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Project ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}
