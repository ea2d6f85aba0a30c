//! Release reconciliation against Linear.
//!
//! Drives the post-publish workflow: resolve the team, optionally
//! create a release tracking issue, then walk every linked issue and
//! apply state transitions and comments. Linked issues are processed
//! strictly sequentially and independently; per-issue failures become
//! warnings instead of aborting the run, so every warning names
//! exactly one identifier.

use std::fmt;

use thiserror::Error;
use tracing::{info, instrument, warn};

use release_hooks::ReleaseContext;

use crate::client::IssueTracker;
use crate::config::Config;
use crate::error::LinearError;
use crate::extract::extract_issue_refs;
use crate::models::{CreateIssueInput, Issue, Team};
use crate::template::{render_template, TemplateError};

/// Fatal reconciliation failures.
///
/// These abort the whole run: without a resolved team nothing
/// downstream can happen, and the release issue is the primary
/// deliverable of its step. Everything else is a [`Warning`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Neither team id nor team key is configured.
    #[error("Either team_id or team_key is required")]
    MissingTeam,

    /// Team lookup failed.
    #[error("Failed to get team: {0}")]
    TeamResolution(#[source] LinearError),

    /// A release-issue template could not be rendered.
    #[error("Failed to render {kind} template: {source}")]
    ReleaseTemplate {
        kind: &'static str,
        #[source]
        source: TemplateError,
    },

    /// Release issue creation failed.
    #[error("Failed to create release issue: {0}")]
    ReleaseIssue(#[source] LinearError),
}

/// Category of a recoverable warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Released state name missing from the team workflow.
    StateNotFound,
    /// Comment template failed to render.
    TemplateRender,
    /// Linked issue could not be fetched.
    IssueFetch,
    /// State transition failed.
    StateUpdate,
    /// Comment creation failed.
    Comment,
}

/// A recoverable failure recorded against a single sub-operation.
#[derive(Debug)]
pub struct Warning {
    /// What went wrong.
    pub kind: WarningKind,
    /// Issue identifier the warning applies to, for per-issue kinds.
    pub identifier: Option<String>,
    /// The missing state name for [`WarningKind::StateNotFound`];
    /// the underlying error text for everything else.
    pub detail: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identifier = self.identifier.as_deref().unwrap_or("?");
        match self.kind {
            WarningKind::StateNotFound => {
                write!(f, "State '{}' not found in team workflow", self.detail)
            }
            WarningKind::TemplateRender => {
                write!(f, "Failed to render comment template: {}", self.detail)
            }
            WarningKind::IssueFetch => {
                write!(f, "Issue {} not found: {}", identifier, self.detail)
            }
            WarningKind::StateUpdate => {
                write!(f, "Failed to update {}: {}", identifier, self.detail)
            }
            WarningKind::Comment => {
                write!(f, "Failed to add comment to {}: {}", identifier, self.detail)
            }
        }
    }
}

/// Accumulated result of one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Release issue created during the run, when enabled.
    pub created_issue: Option<Issue>,
    /// Linked issues moved to the released state.
    pub updated: usize,
    /// Linked issues that received the release comment.
    pub commented: usize,
    /// Recoverable failures, in the order they occurred.
    pub warnings: Vec<Warning>,
}

impl ReconcileOutcome {
    /// Human-readable summary in fixed order: creation result, update
    /// count, comment count, then every warning.
    #[must_use]
    pub fn summary(&self, released_state: &str) -> String {
        let mut parts = Vec::new();

        if let Some(issue) = &self.created_issue {
            parts.push(format!(
                "Created release issue: {} ({})",
                issue.identifier,
                issue.url.as_deref().unwrap_or("")
            ));
        }
        if self.updated > 0 {
            parts.push(format!(
                "Updated {} issue(s) to '{released_state}'",
                self.updated
            ));
        }
        if self.commented > 0 {
            parts.push(format!(
                "Added release comment to {} issue(s)",
                self.commented
            ));
        }
        for warning in &self.warnings {
            parts.push(format!("Warning: {warning}"));
        }

        if parts.is_empty() {
            return "No actions taken".to_string();
        }
        parts.join("; ")
    }
}

/// Orchestrates one post-publish reconciliation run.
///
/// Owns no state beyond the outcome accumulator of the run in flight;
/// the host guarantees at most one run per configuration at a time.
pub struct Reconciler<'a> {
    tracker: &'a dyn IssueTracker,
    config: &'a Config,
    context: &'a ReleaseContext,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(
        tracker: &'a dyn IssueTracker,
        config: &'a Config,
        context: &'a ReleaseContext,
    ) -> Self {
        Self {
            tracker,
            config,
            context,
        }
    }

    /// Run the full reconciliation.
    #[instrument(skip_all, fields(version = %self.context.version))]
    pub async fn run(&self) -> Result<ReconcileOutcome, ReconcileError> {
        let lookup = self
            .config
            .team_lookup()
            .ok_or(ReconcileError::MissingTeam)?;
        let team = self
            .tracker
            .get_team(&lookup)
            .await
            .map_err(ReconcileError::TeamResolution)?;
        info!(team = %team.key, "Resolved Linear team");

        let mut outcome = ReconcileOutcome::default();

        if self.config.create_release_issue {
            let issue = self.create_release_issue(&team).await?;
            info!(identifier = %issue.identifier, "Created release issue");
            outcome.created_issue = Some(issue);
        }

        if self.config.update_linked_issues || self.config.add_release_comment {
            let refs = self.linked_issue_refs();
            if !refs.is_empty() {
                self.process_linked_issues(&team, &refs, &mut outcome).await;
            }
        }

        Ok(outcome)
    }

    /// Render-only preview for dry runs. Makes no gateway calls.
    #[must_use]
    pub fn preview(config: &Config, context: &ReleaseContext) -> String {
        let mut parts = Vec::new();

        if config.create_release_issue {
            let title = render_template(&config.release_issue.title, context).unwrap_or_default();
            parts.push(format!("Would create release issue: {title}"));
        }
        if config.update_linked_issues {
            parts.push(format!(
                "Would update linked issues to state: {}",
                config.released_state
            ));
        }
        if config.add_release_comment {
            let comment = render_template(&config.comment_template, context).unwrap_or_default();
            parts.push(format!("Would add comment to linked issues: {comment}"));
        }

        if parts.is_empty() {
            return "No actions taken".to_string();
        }
        parts.join("; ")
    }

    /// Linked issue identifiers from commit descriptions, in fixed
    /// bucket order (features, fixes, breaking, other).
    fn linked_issue_refs(&self) -> Vec<String> {
        let descriptions = self.context.commit_descriptions();
        extract_issue_refs(&descriptions, &self.config.issue_prefix)
    }

    async fn create_release_issue(&self, team: &Team) -> Result<Issue, ReconcileError> {
        let title = render_template(&self.config.release_issue.title, self.context)
            .map_err(|source| ReconcileError::ReleaseTemplate {
                kind: "title",
                source,
            })?;
        let description = render_template(&self.config.release_issue.description, self.context)
            .map_err(|source| ReconcileError::ReleaseTemplate {
                kind: "description",
                source,
            })?;

        let priority = i32::try_from(self.config.release_issue.priority).unwrap_or(0);
        let input = CreateIssueInput {
            team_id: team.id.clone(),
            title,
            description: (!description.is_empty()).then_some(description),
            priority: (priority > 0).then_some(priority),
            project_id: (!self.config.project_id.is_empty())
                .then(|| self.config.project_id.clone()),
        };

        self.tracker
            .create_issue(input)
            .await
            .map_err(ReconcileError::ReleaseIssue)
    }

    /// Fetch, transition, and comment each linked issue independently.
    ///
    /// One-time setup failures (missing released state, comment
    /// template render) suppress the corresponding per-issue step for
    /// the whole run via run-local flags; configuration is never
    /// touched.
    async fn process_linked_issues(
        &self,
        team: &Team,
        refs: &[String],
        outcome: &mut ReconcileOutcome,
    ) {
        let mut released_state_id = None;
        if self.config.update_linked_issues && !self.config.released_state.is_empty() {
            released_state_id = team
                .states
                .iter()
                .find(|state| state.name.eq_ignore_ascii_case(&self.config.released_state))
                .map(|state| state.id.clone());
            if released_state_id.is_none() {
                warn!(state = %self.config.released_state, "Released state not found in team workflow");
                outcome.warnings.push(Warning {
                    kind: WarningKind::StateNotFound,
                    identifier: None,
                    detail: self.config.released_state.clone(),
                });
            }
        }

        let mut comment = None;
        if self.config.add_release_comment {
            match render_template(&self.config.comment_template, self.context) {
                Ok(body) => comment = Some(body),
                Err(e) => {
                    warn!(error = %e, "Comment template render failed, skipping comments");
                    outcome.warnings.push(Warning {
                        kind: WarningKind::TemplateRender,
                        identifier: None,
                        detail: e.to_string(),
                    });
                }
            }
        }

        for issue_ref in refs {
            let issue = match self.tracker.get_issue_by_identifier(issue_ref).await {
                Ok(issue) => issue,
                Err(e) => {
                    warn!(identifier = %issue_ref, error = %e, "Linked issue fetch failed");
                    outcome.warnings.push(Warning {
                        kind: WarningKind::IssueFetch,
                        identifier: Some(issue_ref.clone()),
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            if let Some(state_id) = &released_state_id {
                match self.tracker.update_issue_state(&issue.id, state_id).await {
                    Ok(()) => outcome.updated += 1,
                    Err(e) => {
                        warn!(identifier = %issue_ref, error = %e, "State transition failed");
                        outcome.warnings.push(Warning {
                            kind: WarningKind::StateUpdate,
                            identifier: Some(issue_ref.clone()),
                            detail: e.to_string(),
                        });
                    }
                }
            }

            if let Some(body) = &comment {
                match self.tracker.add_comment(&issue.id, body).await {
                    Ok(()) => outcome.commented += 1,
                    Err(e) => {
                        warn!(identifier = %issue_ref, error = %e, "Comment failed");
                        outcome.warnings.push(Warning {
                            kind: WarningKind::Comment,
                            identifier: Some(issue_ref.clone()),
                            detail: e.to_string(),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockIssueTracker;
    use crate::models::{TeamLookup, WorkflowState};
    use release_hooks::{Changes, CommitInfo};
    use serde_json::json;

    fn state(id: &str, name: &str, state_type: &str) -> WorkflowState {
        WorkflowState {
            id: id.to_string(),
            name: name.to_string(),
            state_type: state_type.to_string(),
        }
    }

    fn team() -> Team {
        Team {
            id: "team-1".to_string(),
            key: "ENG".to_string(),
            name: "Engineering".to_string(),
            states: vec![
                state("s1", "Backlog", "backlog"),
                state("s2", "In Progress", "started"),
                state("s3", "Done", "completed"),
            ],
        }
    }

    fn issue(id: &str, identifier: &str) -> Issue {
        Issue {
            id: id.to_string(),
            identifier: identifier.to_string(),
            title: format!("Issue {identifier}"),
            url: Some(format!("https://linear.app/eng/issue/{identifier}")),
            state: None,
        }
    }

    fn commit(description: &str) -> CommitInfo {
        CommitInfo {
            description: description.to_string(),
            ..CommitInfo::default()
        }
    }

    fn context() -> ReleaseContext {
        ReleaseContext {
            version: "1.2.3".to_string(),
            tag_name: "v1.2.3".to_string(),
            branch: "main".to_string(),
            release_type: "minor".to_string(),
            release_notes: "notes".to_string(),
            commit_sha: "abc1234".to_string(),
            changes: Some(Changes {
                features: vec![commit("feat: add X ENG-123")],
                fixes: vec![commit("fix: Y ENG-456")],
                breaking: vec![],
                other: vec![],
            }),
        }
    }

    fn config(value: serde_json::Value) -> Config {
        Config::from_map(&value.as_object().cloned().unwrap())
    }

    /// Base config: no release issue, both linked-issue steps on.
    fn linked_only_config() -> Config {
        config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1",
            "issue_prefix": "ENG",
            "create_release_issue": false
        }))
    }

    fn expect_team(mock: &mut MockIssueTracker) {
        mock.expect_get_team()
            .withf(|lookup| *lookup == TeamLookup::Id("team-1".to_string()))
            .returning(|_| Ok(team()));
    }

    #[tokio::test]
    async fn test_transitions_and_comments_all_linked_issues() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_get_issue_by_identifier()
            .withf(|id| id == "ENG-123")
            .returning(|_| Ok(issue("uuid-123", "ENG-123")));
        mock.expect_get_issue_by_identifier()
            .withf(|id| id == "ENG-456")
            .returning(|_| Ok(issue("uuid-456", "ENG-456")));
        // Both issues move to Done's state id
        mock.expect_update_issue_state()
            .withf(|_, state_id| state_id == "s3")
            .times(2)
            .returning(|_, _| Ok(()));
        mock.expect_add_comment()
            .withf(|_, body| body == "Released in 1.2.3")
            .times(2)
            .returning(|_, _| Ok(()));

        let cfg = linked_only_config();
        let ctx = context();
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();

        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.commented, 2);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.created_issue.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_isolates_one_issue() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_get_issue_by_identifier()
            .withf(|id| id == "ENG-123")
            .returning(|_| Ok(issue("uuid-123", "ENG-123")));
        mock.expect_get_issue_by_identifier()
            .withf(|id| id == "ENG-456")
            .returning(|id| Err(LinearError::NotFound(format!("issue {id}"))));
        mock.expect_update_issue_state()
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_add_comment().times(1).returning(|_, _| Ok(()));

        let cfg = linked_only_config();
        let ctx = context();
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.commented, 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::IssueFetch);
        assert_eq!(outcome.warnings[0].identifier.as_deref(), Some("ENG-456"));
    }

    #[tokio::test]
    async fn test_missing_released_state_skips_transitions_not_comments() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_get_issue_by_identifier()
            .times(2)
            .returning(|id| Ok(issue("uuid", id)));
        // No update_issue_state expectation: any call would panic
        mock.expect_add_comment().times(2).returning(|_, _| Ok(()));

        let cfg = config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1",
            "issue_prefix": "ENG",
            "create_release_issue": false,
            "released_state": "Shipped"
        }));
        let ctx = context();
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();

        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.commented, 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::StateNotFound);
        assert!(outcome.warnings[0].to_string().contains("Shipped"));
    }

    #[tokio::test]
    async fn test_released_state_match_is_case_insensitive() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_get_issue_by_identifier()
            .times(2)
            .returning(|id| Ok(issue("uuid", id)));
        mock.expect_update_issue_state()
            .withf(|_, state_id| state_id == "s3")
            .times(2)
            .returning(|_, _| Ok(()));

        let cfg = config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1",
            "issue_prefix": "ENG",
            "create_release_issue": false,
            "add_release_comment": false,
            "released_state": "dOnE"
        }));
        let ctx = context();
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();
        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.commented, 0);
    }

    #[tokio::test]
    async fn test_comment_template_failure_suppresses_comments_only() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_get_issue_by_identifier()
            .times(2)
            .returning(|id| Ok(issue("uuid", id)));
        mock.expect_update_issue_state()
            .times(2)
            .returning(|_, _| Ok(()));
        // No add_comment expectation: rendering failed up front

        let cfg = config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1",
            "issue_prefix": "ENG",
            "create_release_issue": false,
            "comment_template": "Released in {{NotAField}}"
        }));
        let ctx = context();
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();

        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.commented, 0);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::TemplateRender);
    }

    #[tokio::test]
    async fn test_transition_failure_still_comments() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_get_issue_by_identifier()
            .times(2)
            .returning(|id| Ok(issue("uuid", id)));
        mock.expect_update_issue_state()
            .times(2)
            .returning(|_, _| Err(LinearError::Api("locked".to_string())));
        mock.expect_add_comment().times(2).returning(|_, _| Ok(()));

        let cfg = linked_only_config();
        let ctx = context();
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();

        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.commented, 2);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome
            .warnings
            .iter()
            .all(|w| w.kind == WarningKind::StateUpdate));
    }

    #[tokio::test]
    async fn test_team_resolution_failure_is_fatal() {
        let mut mock = MockIssueTracker::new();
        mock.expect_get_team()
            .returning(|_| Err(LinearError::Api("unauthorized".to_string())));

        let cfg = linked_only_config();
        let ctx = context();
        let err = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap_err();
        assert!(matches!(err, ReconcileError::TeamResolution(_)));
        assert!(err.to_string().starts_with("Failed to get team"));
    }

    #[tokio::test]
    async fn test_release_issue_failure_aborts_before_linked_issues() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_create_issue()
            .returning(|_| Err(LinearError::MutationFailed("quota".to_string())));
        // No get_issue_by_identifier expectation: reconciliation must
        // not start after a fatal creation failure

        let cfg = config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1",
            "issue_prefix": "ENG"
        }));
        let ctx = context();
        let err = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap_err();
        assert!(matches!(err, ReconcileError::ReleaseIssue(_)));
    }

    #[tokio::test]
    async fn test_release_issue_created_with_rendered_templates() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_create_issue()
            .withf(|input| {
                input.team_id == "team-1"
                    && input.title == "Release 1.2.3"
                    && input.priority == Some(4)
                    && input.project_id.is_none()
                    && input
                        .description
                        .as_deref()
                        .is_some_and(|d| d.contains("## Release 1.2.3"))
            })
            .returning(|_| Ok(issue("uuid-rel", "ENG-900")));

        let cfg = config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1",
            "issue_prefix": "ENG",
            "update_linked_issues": false,
            "add_release_comment": false
        }));
        let ctx = context();
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();

        let created = outcome.created_issue.as_ref().unwrap();
        assert_eq!(created.identifier, "ENG-900");
        let summary = outcome.summary(&cfg.released_state);
        assert!(summary.contains("Created release issue: ENG-900"));
    }

    #[tokio::test]
    async fn test_zero_linked_issues_is_success() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        // No per-issue expectations: nothing should be fetched

        let cfg = linked_only_config();
        let ctx = ReleaseContext {
            changes: Some(Changes::default()),
            ..context()
        };
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();

        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.commented, 0);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.summary(&cfg.released_state), "No actions taken");
    }

    #[tokio::test]
    async fn test_prefix_filter_limits_reconciliation() {
        let mut mock = MockIssueTracker::new();
        expect_team(&mut mock);
        mock.expect_get_issue_by_identifier()
            .withf(|id| id == "ENG-123")
            .times(1)
            .returning(|_| Ok(issue("uuid-123", "ENG-123")));
        mock.expect_update_issue_state()
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_add_comment().times(1).returning(|_, _| Ok(()));

        let cfg = linked_only_config();
        let ctx = ReleaseContext {
            changes: Some(Changes {
                features: vec![commit("feat: ENG-123 and OPS-1")],
                ..Changes::default()
            }),
            ..context()
        };
        let outcome = Reconciler::new(&mock, &cfg, &ctx).run().await.unwrap();
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn test_summary_order() {
        let outcome = ReconcileOutcome {
            created_issue: Some(issue("uuid", "ENG-900")),
            updated: 2,
            commented: 1,
            warnings: vec![Warning {
                kind: WarningKind::IssueFetch,
                identifier: Some("ENG-7".to_string()),
                detail: "issue ENG-7 not found".to_string(),
            }],
        };

        let summary = outcome.summary("Done");
        assert_eq!(
            summary,
            "Created release issue: ENG-900 (https://linear.app/eng/issue/ENG-900); \
             Updated 2 issue(s) to 'Done'; \
             Added release comment to 1 issue(s); \
             Warning: Issue ENG-7 not found: issue ENG-7 not found"
        );
    }

    #[test]
    fn test_preview_renders_without_gateway() {
        let cfg = config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1"
        }));
        let ctx = context();

        let preview = Reconciler::preview(&cfg, &ctx);
        assert!(preview.contains("Would create release issue: Release 1.2.3"));
        assert!(preview.contains("Would update linked issues to state: Done"));
        assert!(preview.contains("Would add comment to linked issues: Released in 1.2.3"));
    }

    #[test]
    fn test_preview_with_everything_disabled() {
        let cfg = config(json!({
            "api_key": "lin_api_test",
            "team_id": "team-1",
            "create_release_issue": false,
            "update_linked_issues": false,
            "add_release_comment": false
        }));
        assert_eq!(Reconciler::preview(&cfg, &context()), "No actions taken");
    }
}
