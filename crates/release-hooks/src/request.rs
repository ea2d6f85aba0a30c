//! Hook kinds and the execute request/response shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::ReleaseContext;

/// Lifecycle hooks a plugin can participate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    /// After the release plan is computed, before anything is published.
    PostPlan,
    /// After the release has been published.
    PostPublish,
    /// When the release pipeline fails.
    OnError,
}

impl Hook {
    /// Parse a host-supplied hook name.
    ///
    /// Unknown names yield `None`; hook sets grow over time, so the
    /// dispatcher treats those as no-ops rather than failures.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "post_plan" => Some(Self::PostPlan),
            "post_publish" => Some(Self::PostPublish),
            "on_error" => Some(Self::OnError),
            _ => None,
        }
    }

    /// Wire name of the hook.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PostPlan => "post_plan",
            Self::PostPublish => "post_publish",
            Self::OnError => "on_error",
        }
    }
}

/// Plugin metadata reported to the host.
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    /// Plugin name.
    pub name: &'static str,
    /// Plugin version.
    pub version: &'static str,
    /// Human description.
    pub description: &'static str,
    /// Author.
    pub author: &'static str,
    /// Hooks the plugin handles.
    pub hooks: Vec<Hook>,
}

/// A single plugin invocation from the host.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    /// Hook name being dispatched. Kept as a string so unrecognized
    /// hooks can still be echoed back in the response.
    pub hook: String,
    /// Raw plugin configuration.
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Release context for this invocation.
    #[serde(default)]
    pub context: ReleaseContext,
    /// When set, the plugin must not perform any remote mutation.
    #[serde(default)]
    pub dry_run: bool,
}

/// Structured result of a plugin invocation.
///
/// Every invocation returns one of these, even on failure; the host
/// is never handed an unstructured crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Whether the invocation succeeded.
    pub success: bool,
    /// Human-readable summary of what happened.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Failure description; set only when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured outputs for downstream hooks.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub outputs: Map<String, Value>,
}

impl ExecuteResponse {
    /// Successful response with a message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            outputs: Map::new(),
        }
    }

    /// Failed response with an error description.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: String::new(),
            error: Some(error.into()),
            outputs: Map::new(),
        }
    }

    /// Attach a structured output value.
    #[must_use]
    pub fn with_output(mut self, key: impl Into<String>, value: Value) -> Self {
        self.outputs.insert(key.into(), value);
        self
    }
}
