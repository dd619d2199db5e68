// Task Descriptor Models
// Backend-specific task payloads and the envelope handed to the submitter

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Which execution backend a task targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskBackend {
    ContainerPod,
    Vm,
    HostedVm,
}

/// Wire format of the serialized payload. JSON is mandatory whenever the
/// payload carries already-decrypted secrets (the hosted-VM backend); those
/// payloads must not pass through the binary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SerializationFormat {
    Binary,
    Json,
}

/// Fully-built task handed to the submission boundary. Created and
/// discarded per step invocation; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    /// Backend tag the payload was built for
    pub backend: TaskBackend,
    /// Task type routed by the remote agent
    pub task_type: String,
    /// Wire format of `payload`
    pub format: SerializationFormat,
    /// Serialized step payload
    pub payload: Vec<u8>,
    /// Delegate / pool routing selectors
    pub selectors: Vec<String>,
    /// Route to the managed hosted fleet instead of own infrastructure
    pub route_to_hosted_fleet: bool,
    /// Absolute execution timeout
    pub timeout: Duration,
    /// Runtime id of the enclosing stage
    pub stage_runtime_id: String,
    /// Runtime id of the step (or stage, for provisioning tasks)
    pub step_runtime_id: String,
}

/// Binary payload executed inside a stage's container pod
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PodTaskPayload {
    #[prost(string, tag = "1")]
    pub step_identifier: String,
    #[prost(string, tag = "2")]
    pub ip_address: String,
    #[prost(string, tag = "3")]
    pub namespace: String,
    #[prost(string, tag = "4")]
    pub image: String,
    #[prost(string, tag = "5")]
    pub command: String,
    #[prost(map = "string, string", tag = "6")]
    pub env: HashMap<String, String>,
    #[prost(uint64, tag = "7")]
    pub timeout_secs: u64,
    /// Background steps keep running after the dispatcher returns
    #[prost(bool, tag = "8")]
    pub detach: bool,
}

/// Payload executed on a pool-leased VM. Serialized with prost on the
/// self-managed path and as JSON inside [`HostedVmTaskEnvelope`] on the
/// hosted path.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmTaskPayload {
    #[prost(string, tag = "1")]
    pub step_identifier: String,
    #[prost(string, tag = "2")]
    pub ip_address: String,
    #[prost(string, tag = "3")]
    pub pool_id: String,
    #[prost(string, tag = "4")]
    pub working_dir: String,
    /// Volume name → mount path
    #[prost(map = "string, string", tag = "5")]
    pub volume_mounts: HashMap<String, String>,
    /// Backend-defined infrastructure discriminator
    #[prost(string, tag = "6")]
    pub infra_info: String,
    #[prost(string, tag = "7")]
    pub image: String,
    #[prost(string, tag = "8")]
    pub command: String,
    #[prost(map = "string, string", tag = "9")]
    pub env: HashMap<String, String>,
    #[prost(uint64, tag = "10")]
    pub timeout_secs: u64,
}

/// Host-fleet envelope wrapping a VM payload. Always serialized as JSON:
/// secrets inside are pre-decrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedVmTaskEnvelope {
    pub vm: VmTaskPayload,
    /// Platform selector derived from the requested OS and architecture,
    /// e.g. `linux-amd64`
    pub platform: String,
    pub pool_id: String,
    pub secrets_decrypted: bool,
}

/// Provisioning payload submitted by the stage initializer
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionPayload {
    #[prost(string, tag = "1")]
    pub stage_runtime_id: String,
    #[prost(string, tag = "2")]
    pub namespace: String,
    #[prost(string, tag = "3")]
    pub pool_id: String,
    #[prost(string, tag = "4")]
    pub infra_info: String,
    /// Declared service-container identifiers to bring up with the stage
    #[prost(string, repeated, tag = "5")]
    pub service_identifiers: Vec<String>,
}
