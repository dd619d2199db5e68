// Execution Outcome Models
// Uniform step result handed back to the orchestration engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Terminal status of a step. A submitted step resolves to exactly one of
/// these; terminal states are exclusive and final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Classification attached to FAILED outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Defensive fallback: malformed response, transport fault, internal
    /// error. Not retryable at this layer.
    Application,
    /// Step configuration rejected before submission
    Validation,
    /// Stage infrastructure could not be provisioned
    Provisioning,
    /// The agent explicitly reported a non-success command status
    Remote,
}

/// What kind of build output an artifact record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    Image,
    File,
    Sbom,
}

/// Canonical description of a published build output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub image_name: String,
    pub tag: String,
    pub digest: Option<String>,
    /// None when the registry/host combination has no known URL scheme
    pub console_url: Option<String>,
    pub kind: ArtifactKind,
}

/// Uniform step outcome: status, captured outputs, artifact records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    /// Output variables exported by the step, qualified by the engine under
    /// the step identifier
    #[serde(default)]
    pub outputs: HashMap<String, String>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
    pub error_message: Option<String>,
    pub failure_kind: Option<FailureKind>,
    /// SLSA-style attestation payload describing how the artifact was built
    pub provenance: Option<serde_json::Value>,
}

impl ExecutionOutcome {
    /// A SUCCEEDED outcome with no outputs or artifacts
    pub fn succeeded() -> Self {
        Self {
            status: ExecutionStatus::Succeeded,
            outputs: HashMap::new(),
            artifacts: Vec::new(),
            error_message: None,
            failure_kind: None,
            provenance: None,
        }
    }

    /// A SKIPPED outcome; skipped steps never carry outputs
    pub fn skipped() -> Self {
        Self {
            status: ExecutionStatus::Skipped,
            outputs: HashMap::new(),
            artifacts: Vec::new(),
            error_message: None,
            failure_kind: None,
            provenance: None,
        }
    }

    /// A FAILED outcome with a human-readable message and classification
    pub fn failed(message: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            outputs: HashMap::new(),
            artifacts: Vec::new(),
            error_message: Some(message.into()),
            failure_kind: Some(kind),
            provenance: None,
        }
    }

    /// Attach output variables
    pub fn with_outputs(mut self, outputs: HashMap<String, String>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Attach artifact records
    pub fn with_artifacts(mut self, artifacts: Vec<ArtifactRecord>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Attach a provenance predicate
    pub fn with_provenance(mut self, provenance: serde_json::Value) -> Self {
        self.provenance = Some(provenance);
        self
    }
}

/// Health of one declared service container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyState {
    Success,
    Error,
}

/// Uniform status of one service-container dependency of a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStatus {
    pub identifier: String,
    pub name: String,
    pub image: String,
    pub started_at_millis: Option<u64>,
    pub ended_at_millis: Option<u64>,
    pub status: DependencyState,
    pub error_message: Option<String>,
    /// Key the engine uses to fetch the service's remote logs
    pub log_key: Option<String>,
}
