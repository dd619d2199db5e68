// External Boundaries
// Collaborator traits and the raw response shapes consumed from them

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifacts::ImagePushed;
use crate::models::TaskDescriptor;

/// Command status reported by the remote agent for one executed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    Success,
    Failure,
    Skipped,
    Timeout,
}

/// Raw per-step response read from the callback payload. The transport
/// delivers a tagged union; [`RawResponse::Unrecognized`] covers entries
/// whose tag matches neither expected type.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    ContainerPod(PodStepResponse),
    Vm(VmStepResponse),
    Unrecognized { detail: String },
}

impl RawResponse {
    /// The pushed-image descriptor carried by the response, if any
    pub fn artifact(&self) -> Option<&ImagePushed> {
        match self {
            RawResponse::ContainerPod(r) => r.artifact.as_ref(),
            RawResponse::Vm(r) => r.artifact.as_ref(),
            RawResponse::Unrecognized { .. } => None,
        }
    }
}

/// Response returned by the agent for a container-pod step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStepResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub error_message: String,
    /// Exported output variables as a JSON object of strings. Left as raw
    /// JSON because extraction is fallible and must never fail the step.
    pub outputs: Option<serde_json::Value>,
    pub artifact: Option<ImagePushed>,
    /// SLSA-style attestation payload, when the step produced one
    pub provenance: Option<serde_json::Value>,
}

/// Response returned by the agent for a VM or hosted-VM step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmStepResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub error_message: String,
    pub outputs: Option<serde_json::Value>,
    pub artifact: Option<ImagePushed>,
    pub provenance: Option<serde_json::Value>,
}

/// Infrastructure details reported by a successful provisioning response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProvisionedInfra {
    Pod { ip_address: String, namespace: String },
    Vm { ip_address: String },
}

/// Health of one service container as reported by provisioning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub identifier: String,
    pub image: String,
    pub healthy: bool,
    pub error_message: Option<String>,
    pub started_at_millis: Option<u64>,
    pub ended_at_millis: Option<u64>,
}

/// Raw response for a stage provisioning task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub error_message: String,
    pub infra: Option<ProvisionedInfra>,
    #[serde(default)]
    pub service_statuses: Vec<ServiceHealth>,
}

/// Transport-level submission failure. Retries, if any, happen inside the
/// transport collaborator, never here.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SubmitError(pub String);

/// Task submission boundary. The dispatcher builds the payload and format
/// tag; transport is the collaborator's concern.
#[async_trait]
pub trait TaskSubmitter: Send + Sync {
    /// Submit a task for asynchronous execution and return the callback id
    /// the response will be keyed by.
    async fn submit(&self, task: &TaskDescriptor) -> Result<String, SubmitError>;
}

/// Failure resolving a connector reference
#[derive(Debug, Clone, Error)]
#[error("connector {connector_ref}: {message}")]
pub struct ConnectorError {
    pub connector_ref: String,
    pub message: String,
}

/// Resolved connector identity and credentials reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorDetails {
    pub identifier: String,
    pub url: Option<String>,
    pub credentials_ref: Option<String>,
}

/// Connector / credential resolution boundary. Asked before parameter
/// building for every connector the step references; failures surface as
/// step-validation errors and are not retried internally.
#[async_trait]
pub trait ConnectorResolver: Send + Sync {
    async fn resolve(&self, connector_ref: &str) -> Result<ConnectorDetails, ConnectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_status_serde() {
        let json = serde_json::to_string(&CommandStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        let status: CommandStatus = serde_json::from_str("\"TIMEOUT\"").unwrap();
        assert_eq!(status, CommandStatus::Timeout);
    }

    #[test]
    fn test_artifact_accessor() {
        let response = RawResponse::Vm(VmStepResponse {
            status: CommandStatus::Success,
            error_message: String::new(),
            outputs: None,
            artifact: Some(ImagePushed {
                image: "a/b:1".to_string(),
                digest: None,
                registry_host: "index.docker.io".to_string(),
            }),
            provenance: None,
        });
        assert!(response.artifact().is_some());

        let response = RawResponse::Unrecognized {
            detail: "git task response".to_string(),
        };
        assert!(response.artifact().is_none());
    }
}
