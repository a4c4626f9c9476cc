//! Error types for the Knihomol pipeline.

use thiserror::Error;

/// Result type alias using Knihomol's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of a single structured extraction attempt.
///
/// Kept as a tagged variant (rather than strings) so callers can
/// discriminate causes without inspecting messages. The orchestrator
/// treats all three the same for the user-facing flow; logs keep the kind.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The model returned no usable text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The model text did not parse as a record matching the schema.
    #[error("response did not match the record schema: {0}")]
    Schema(String),

    /// The request itself failed (network, HTTP status, timeout).
    #[error("transport error: {0}")]
    Transport(String),
}

/// Core error type for Knihomol operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (e.g. absent API credential).
    /// Fatal: surfaced immediately, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image analysis failed. The user is returned to the start with a
    /// retry invitation.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// A conversational exchange failed.
    #[error("Conversation error: {0}")]
    Conversation(String),

    /// Allow-list fetch or parse failed.
    #[error("Allow-list error: {0}")]
    AllowList(String),

    /// An operation was requested from a stage that does not permit it.
    #[error("Invalid state: {0}")]
    State(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
