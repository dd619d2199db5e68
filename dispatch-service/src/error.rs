// Dispatch error taxonomy
// Classifies every failure path from validation through remote execution

use thiserror::Error;

/// Errors surfaced by the dispatch pipeline. An agent-reported execution
/// failure is not an error here: the reconciler passes its message through
/// verbatim on the outcome, classified as a remote failure.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Required step field missing or mutually-exclusive options both set.
    /// Synchronous, never submitted to the remote agent, never retried.
    #[error("validation failure: {0}")]
    Validation(String),

    /// Stage infra could not be created or returned no usable address.
    /// Fatal for the stage; no step in the stage may be dispatched.
    #[error("provisioning failure: {0}")]
    Provisioning(String),

    /// Transport-level failure while submitting a task. Retry policy,
    /// if any, belongs to the transport collaborator.
    #[error("submission failure: {0}")]
    Submission(String),

    /// Recoverable: artifact metadata could not be decoded. The step's
    /// execution status is unaffected.
    #[error("artifact decode failure: {0}")]
    ArtifactDecode(#[from] DecodeError),

    /// The callback payload did not contain the expected tagged response
    /// type. Indicates a protocol mismatch with the transport layer.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Error raised by an artifact resolver when registry metadata cannot be
/// mapped to a canonical record
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DecodeError(String);

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
