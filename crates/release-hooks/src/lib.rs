//! Host interface for release lifecycle plugins.
//!
//! This crate defines the contract between the release tool (the
//! host) and a plugin executable:
//! - Hook kinds and plugin metadata
//! - The read-only release context handed to every invocation
//! - Execute request/response shapes
//! - Typed access to the host-supplied configuration map
//! - Validation report accumulation

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod parser;
pub mod request;
pub mod validation;

pub use context::{Changes, CommitInfo, ReleaseContext};
pub use parser::ConfigParser;
pub use request::{ExecuteRequest, ExecuteResponse, Hook, PluginInfo};
pub use validation::{FieldError, ValidationReport, ValidationResponse};
