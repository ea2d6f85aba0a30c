//! Error types for the Linear gateway.

use thiserror::Error;

/// Errors surfaced by the Linear GraphQL gateway.
///
/// Transport failures (`Network`, `Status`) and request-level API
/// rejections (`Api`) are kept distinct: a 200 response can still
/// carry GraphQL errors.
#[derive(Debug, Error)]
pub enum LinearError {
    /// Connectivity, timeout, TLS, or response decoding failure.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status from the API endpoint.
    #[error("Linear API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// GraphQL-level errors despite a successful round trip.
    #[error("GraphQL errors: {0}")]
    Api(String),

    /// Requested entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Mutation round-tripped but the API reported non-success.
    #[error("{0}")]
    MutationFailed(String),

    /// Credential could not be turned into a request header.
    #[error("invalid access token: {0}")]
    InvalidToken(String),
}
