//! Plugin configuration parsing, defaults, and validation.

use serde_json::{Map, Value};

use release_hooks::{ConfigParser, ValidationReport, ValidationResponse};

use crate::client::IssueTracker;
use crate::models::TeamLookup;

/// Expected Linear API key prefix.
pub const API_KEY_PREFIX: &str = "lin_api_";

/// Default released workflow state name.
const DEFAULT_RELEASED_STATE: &str = "Done";

/// Default comment left on linked issues.
const DEFAULT_COMMENT_TEMPLATE: &str = "Released in {{Version}}";

/// Default release issue title.
const DEFAULT_RELEASE_TITLE: &str = "Release {{Version}}";

/// Default release issue description.
const DEFAULT_RELEASE_DESCRIPTION: &str = "\
## Release {{Version}}

**Released:** {{Date}}
**Tag:** {{TagName}}
**Type:** {{ReleaseType}}

### Changes
{{ReleaseNotes}}";

/// Plugin configuration with defaults applied.
///
/// Immutable for the duration of a run; runtime suppression state
/// (e.g., skipping comments after a template failure) lives in the
/// reconciler, never here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Linear API key (`lin_api_*`). Falls back to `LINEAR_API_KEY`.
    pub api_key: String,
    /// Team internal id. Falls back to `LINEAR_TEAM_ID`.
    pub team_id: String,
    /// Team key (e.g., "ENG"); used when no team id is set.
    pub team_key: String,
    /// Optional project to attach the release issue to.
    pub project_id: String,
    /// Prefix filter for linked-issue extraction; defaults to the
    /// team key when unset.
    pub issue_prefix: String,
    /// Workflow state linked issues move into after release.
    pub released_state: String,
    /// Whether to create a release tracking issue.
    pub create_release_issue: bool,
    /// Whether to transition linked issues.
    pub update_linked_issues: bool,
    /// Whether to comment on linked issues.
    pub add_release_comment: bool,
    /// Template for the linked-issue comment.
    pub comment_template: String,
    /// Release tracking issue settings.
    pub release_issue: ReleaseIssueConfig,
}

/// Settings for the release tracking issue.
#[derive(Debug, Clone)]
pub struct ReleaseIssueConfig {
    /// Title template.
    pub title: String,
    /// Description template.
    pub description: String,
    /// Labels to apply. Accepted for forward compatibility; not
    /// currently resolved to Linear label ids.
    pub labels: Vec<String>,
    /// Priority (0 = none, 1 = urgent .. 4 = low).
    pub priority: i64,
    /// Assignee login. Accepted for forward compatibility; not
    /// currently resolved to a Linear user id.
    pub assignee: String,
}

impl ReleaseIssueConfig {
    fn from_value(value: Option<&Value>) -> Self {
        if let Some(block) = value.and_then(Value::as_object) {
            let parser = ConfigParser::new(block);
            Self {
                title: parser.get_str("title", "", DEFAULT_RELEASE_TITLE),
                description: parser.get_str("description", "", DEFAULT_RELEASE_DESCRIPTION),
                labels: parser.get_str_list("labels"),
                priority: parser.get_i64("priority", 4),
                assignee: parser.get_str("assignee", "", ""),
            }
        } else {
            Self {
                title: DEFAULT_RELEASE_TITLE.to_string(),
                description: DEFAULT_RELEASE_DESCRIPTION.to_string(),
                labels: vec!["release".to_string()],
                priority: 4,
                assignee: String::new(),
            }
        }
    }
}

impl Config {
    /// Parse the host configuration map, applying defaults and
    /// environment-variable fallbacks.
    #[must_use]
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let parser = ConfigParser::new(raw);

        let mut config = Self {
            api_key: parser.get_str("api_key", "LINEAR_API_KEY", ""),
            team_id: parser.get_str("team_id", "LINEAR_TEAM_ID", ""),
            team_key: parser.get_str("team_key", "", ""),
            project_id: parser.get_str("project_id", "", ""),
            issue_prefix: parser.get_str("issue_prefix", "", ""),
            released_state: parser.get_str("released_state", "", DEFAULT_RELEASED_STATE),
            create_release_issue: parser.get_bool("create_release_issue", true),
            update_linked_issues: parser.get_bool("update_linked_issues", true),
            add_release_comment: parser.get_bool("add_release_comment", true),
            comment_template: parser.get_str("comment_template", "", DEFAULT_COMMENT_TEMPLATE),
            release_issue: ReleaseIssueConfig::from_value(raw.get("release_issue")),
        };

        // Use team key as issue prefix if not specified
        if config.issue_prefix.is_empty() && !config.team_key.is_empty() {
            config.issue_prefix = config.team_key.clone();
        }

        config
    }

    /// How to resolve the team, preferring the internal id.
    #[must_use]
    pub fn team_lookup(&self) -> Option<TeamLookup> {
        if !self.team_id.is_empty() {
            Some(TeamLookup::Id(self.team_id.clone()))
        } else if !self.team_key.is_empty() {
            Some(TeamLookup::Key(self.team_key.clone()))
        } else {
            None
        }
    }

    /// Validate the configuration.
    ///
    /// `probe` is the tracker used to verify the credential; the
    /// caller passes one only when the key is well-formed. Probe
    /// failures are validation errors, not runtime errors.
    pub async fn validate(&self, probe: Option<&dyn IssueTracker>) -> ValidationResponse {
        let mut report = ValidationReport::new();

        if self.api_key.is_empty() {
            report.add_error("api_key", "Linear API key is required");
            return report.build();
        }

        if self.team_id.is_empty() && self.team_key.is_empty() {
            report.add_error("team_id", "Either team_id or team_key is required");
        }

        if !(0..=4).contains(&self.release_issue.priority) {
            report.add_error("release_issue.priority", "Priority must be between 0 and 4");
        }

        if self.api_key.starts_with(API_KEY_PREFIX) {
            if let Some(tracker) = probe {
                if let Err(e) = tracker.get_viewer().await {
                    report.add_error(
                        "api_key",
                        format!("Failed to authenticate with Linear: {e}"),
                    );
                }
            }
        } else {
            report.add_error(
                "api_key",
                "Invalid Linear API key format (should start with 'lin_api_')",
            );
        }

        report.build()
    }
}
