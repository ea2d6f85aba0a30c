//! Linear integration plugin for release automation.
//!
//! Bridges a release tool's lifecycle hooks to the Linear GraphQL
//! API:
//! - Extracts issue identifiers (e.g., `ENG-123`) from commit messages
//! - Creates a release tracking issue
//! - Moves linked issues to a released workflow state
//! - Adds release comments to linked issues
//!
//! Linked issues are reconciled best-effort: each one is fetched,
//! transitioned, and commented independently, and per-issue failures
//! become warnings in the run summary instead of aborting the run.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Async API methods can fail for transport reasons

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod reconcile;
pub mod template;

pub use client::{IssueTracker, LinearClient};
pub use config::{Config, ReleaseIssueConfig};
pub use error::LinearError;
pub use extract::extract_issue_refs;
pub use handlers::{execute, plugin_info, validate};
pub use models::{CreateIssueInput, Issue, Team, TeamLookup, Viewer, WorkflowState};
pub use reconcile::{ReconcileError, ReconcileOutcome, Reconciler, Warning, WarningKind};
pub use template::{render_template, TemplateError};
