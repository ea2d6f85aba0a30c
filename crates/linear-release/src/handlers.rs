//! Hook dispatch.
//!
//! Every entry point returns a structured response; errors surface as
//! `success: false` with an error string, never as a panic or process
//! exit.

use serde_json::{json, Map, Value};
use tracing::{info, instrument};

use release_hooks::{
    ExecuteRequest, ExecuteResponse, Hook, PluginInfo, ReleaseContext, ValidationResponse,
};

use crate::client::{IssueTracker, LinearClient};
use crate::config::{Config, API_KEY_PREFIX};
use crate::extract::extract_issue_refs;
use crate::reconcile::{ReconcileOutcome, Reconciler};

/// Metadata reported to the host at registration.
#[must_use]
pub fn plugin_info() -> PluginInfo {
    PluginInfo {
        name: "linear",
        version: env!("CARGO_PKG_VERSION"),
        description: "Linear integration: release issues, state transitions, and comments",
        author: "5D Labs",
        hooks: vec![Hook::PostPlan, Hook::PostPublish, Hook::OnError],
    }
}

/// Dispatch one hook invocation.
#[instrument(skip_all, fields(hook = %request.hook, dry_run = request.dry_run))]
pub async fn execute(request: &ExecuteRequest) -> ExecuteResponse {
    let config = Config::from_map(&request.config);

    match Hook::from_name(&request.hook) {
        Some(Hook::PostPlan) => post_plan(&config, &request.context),
        Some(Hook::PostPublish) => post_publish(&config, &request.context, request.dry_run).await,
        Some(Hook::OnError) => {
            ExecuteResponse::success("Release failure noted (no Linear action taken)")
        }
        None => ExecuteResponse::success(format!("Hook {} not implemented", request.hook)),
    }
}

/// Report which Linear issues the release plan touches.
fn post_plan(config: &Config, context: &ReleaseContext) -> ExecuteResponse {
    let descriptions = context.commit_descriptions();
    let refs = extract_issue_refs(&descriptions, &config.issue_prefix);

    if refs.is_empty() {
        return ExecuteResponse::success("No linked Linear issues found in commits")
            .with_output("linked_issues", json!([]));
    }

    info!(count = refs.len(), "Found linked Linear issues");
    ExecuteResponse::success(format!(
        "Found {} linked Linear issues: {}",
        refs.len(),
        refs.join(", ")
    ))
    .with_output("linked_issues", json!(refs))
}

async fn post_publish(config: &Config, context: &ReleaseContext, dry_run: bool) -> ExecuteResponse {
    if dry_run {
        return ExecuteResponse::success(Reconciler::preview(config, context));
    }

    let client = match LinearClient::new(&config.api_key) {
        Ok(client) => client,
        Err(e) => return ExecuteResponse::failure(format!("Failed to create Linear client: {e}")),
    };

    match run_post_publish(&client, config, context).await {
        Ok(outcome) => ExecuteResponse::success(outcome.summary(&config.released_state)),
        Err(e) => ExecuteResponse::failure(e.to_string()),
    }
}

/// Post-publish reconciliation against an arbitrary tracker.
pub(crate) async fn run_post_publish(
    tracker: &dyn IssueTracker,
    config: &Config,
    context: &ReleaseContext,
) -> Result<ReconcileOutcome, crate::reconcile::ReconcileError> {
    Reconciler::new(tracker, config, context).run().await
}

/// Validate a raw configuration map.
///
/// A credential probe is attempted only when the key looks like a
/// Linear API key; malformed keys are rejected without a network call.
pub async fn validate(raw: &Map<String, Value>) -> ValidationResponse {
    let config = Config::from_map(raw);

    let probe = if config.api_key.starts_with(API_KEY_PREFIX) {
        LinearClient::new(&config.api_key).ok()
    } else {
        None
    };

    config
        .validate(probe.as_ref().map(|c| c as &dyn IssueTracker))
        .await
}
