//! Release template rendering.
//!
//! Titles, descriptions, and comments are user-supplied handlebars
//! templates rendered against a fixed release data bag.

use chrono::Utc;
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use release_hooks::ReleaseContext;

/// Template parse or render failure (malformed syntax, unknown field).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TemplateError(#[from] handlebars::RenderError);

/// Fields available to release templates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateData<'a> {
    version: &'a str,
    tag_name: &'a str,
    branch: &'a str,
    release_type: &'a str,
    release_notes: &'a str,
    date: String,
    #[serde(rename = "CommitSHA")]
    commit_sha: &'a str,
}

/// Render `template` against the release context.
///
/// Rendering is strict: referencing a field outside the data bag
/// fails rather than producing an empty string. `Date` is computed at
/// render time in `YYYY-MM-DD` form, so two renders of the same
/// template on different days differ; tests compare ignoring it.
pub fn render_template(template: &str, context: &ReleaseContext) -> Result<String, TemplateError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    // Output is markdown for Linear, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    let data = TemplateData {
        version: &context.version,
        tag_name: &context.tag_name,
        branch: &context.branch,
        release_type: &context.release_type,
        release_notes: &context.release_notes,
        date: Utc::now().format("%Y-%m-%d").to_string(),
        commit_sha: &context.commit_sha,
    };

    Ok(handlebars.render_template(template, &data)?)
}
