// Stage Initializer
// Requests provisioning of the stage environment and consumes the response

use prost::Message;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::boundary::{CommandStatus, ProvisionResponse, ProvisionedInfra, TaskSubmitter};
use crate::dependencies::{build_dependency_outcomes, ServiceDefinition};
use crate::error::DispatchError;
use crate::models::{
    ArchType, DependencyStatus, ExecutionStatus, OsType, ProvisionPayload, SerializationFormat,
    StageInfraDetails, TaskBackend, TaskDescriptor,
};

/// Task type for container-pod provisioning
pub const INITIALIZE_STAGE_POD: &str = "INITIALIZE_STAGE_POD";
/// Task type for self-managed VM provisioning
pub const INITIALIZE_STAGE_VM: &str = "INITIALIZE_STAGE_VM";
/// Task type for hosted-fleet VM provisioning
pub const INITIALIZE_STAGE_HOSTED_VM: &str = "INITIALIZE_STAGE_HOSTED_VM";

/// Provisioning is itself asynchronous and slower than step execution, so
/// its task timeout is the stage-declared timeout plus this buffer.
pub const PROVISION_TIMEOUT_BUFFER: Duration = Duration::from_secs(30);

/// Infrastructure requested for a stage
#[derive(Debug, Clone, PartialEq)]
pub enum InfraRequest {
    ContainerPod {
        namespace: String,
    },
    Vm {
        pool_id: String,
        working_dir: String,
        volume_mounts: HashMap<String, String>,
        infra_info: String,
    },
    HostedVm {
        pool_id: String,
        working_dir: String,
        volume_mounts: HashMap<String, String>,
        infra_info: String,
        os: OsType,
        arch: ArchType,
    },
}

/// Declarative description of the stage environment to provision
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub stage_runtime_id: String,
    pub timeout: Duration,
    pub infra: InfraRequest,
    /// Service containers to bring up alongside the stage
    pub services: Vec<ServiceDefinition>,
}

/// Result of stage initialization. On failure `infra` is None but the
/// dependency outcome is still attached so the engine can report partial
/// diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub status: ExecutionStatus,
    pub infra: Option<StageInfraDetails>,
    pub error_message: Option<String>,
    pub dependencies: Vec<DependencyStatus>,
}

impl StageOutcome {
    fn failed(message: impl Into<String>, dependencies: Vec<DependencyStatus>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            infra: None,
            error_message: Some(message.into()),
            dependencies,
        }
    }
}

/// Provisions (or requests provisioning of) the stage's execution
/// environment. Submission and response consumption are split the same way
/// step dispatch is: `initialize` returns a callback id, and the engine
/// routes the provisioning response to `on_provision_response`.
pub struct StageInitializer {
    submitter: Arc<dyn TaskSubmitter>,
}

impl StageInitializer {
    pub fn new(submitter: Arc<dyn TaskSubmitter>) -> Self {
        Self { submitter }
    }

    /// Submit the provisioning task for a stage and return its callback id
    pub async fn initialize(&self, spec: &StageSpec) -> Result<String, DispatchError> {
        let task = provision_task(spec)?;
        let callback_id = self
            .submitter
            .submit(&task)
            .await
            .map_err(|e| DispatchError::Provisioning(e.to_string()))?;
        debug!(
            stage = %spec.stage_runtime_id,
            %callback_id,
            task_type = %task.task_type,
            "stage provisioning submitted"
        );
        Ok(callback_id)
    }

    /// Consume the provisioning response and produce the stage outcome.
    /// The dependency-status list is built in every branch, success or not.
    pub fn on_provision_response(
        &self,
        spec: &StageSpec,
        response: &ProvisionResponse,
    ) -> StageOutcome {
        let dependencies = build_dependency_outcomes(&spec.services, &response.service_statuses);

        if response.status != CommandStatus::Success {
            let message = if response.error_message.is_empty() {
                "stage provisioning failed".to_string()
            } else {
                response.error_message.clone()
            };
            return StageOutcome::failed(message, dependencies);
        }

        match build_infra(spec, response.infra.as_ref()) {
            Ok(infra) => StageOutcome {
                status: ExecutionStatus::Succeeded,
                infra: Some(infra),
                error_message: None,
                dependencies,
            },
            Err(error) => StageOutcome::failed(error.to_string(), dependencies),
        }
    }
}

fn build_infra(
    spec: &StageSpec,
    provisioned: Option<&ProvisionedInfra>,
) -> Result<StageInfraDetails, DispatchError> {
    match (&spec.infra, provisioned) {
        (InfraRequest::ContainerPod { namespace }, Some(ProvisionedInfra::Pod { ip_address, namespace: reported_namespace })) => {
            if ip_address.trim().is_empty() {
                return Err(DispatchError::Provisioning(
                    "pod local ipAddress in initialise outcome cannot be empty".to_string(),
                ));
            }
            let namespace = if reported_namespace.is_empty() {
                namespace
            } else {
                reported_namespace
            };
            Ok(StageInfraDetails::container_pod(ip_address, namespace))
        }
        (
            InfraRequest::Vm {
                pool_id,
                working_dir,
                volume_mounts,
                infra_info,
            },
            Some(ProvisionedInfra::Vm { ip_address }),
        ) => {
            if ip_address.trim().is_empty() {
                return Err(DispatchError::Provisioning(
                    "vm ipAddress in initialise outcome cannot be empty".to_string(),
                ));
            }
            StageInfraDetails::vm(
                pool_id,
                ip_address,
                working_dir,
                volume_mounts.clone(),
                infra_info,
            )
        }
        (
            InfraRequest::HostedVm {
                pool_id,
                working_dir,
                volume_mounts,
                infra_info,
                os,
                arch,
            },
            Some(ProvisionedInfra::Vm { ip_address }),
        ) => {
            if ip_address.trim().is_empty() {
                return Err(DispatchError::Provisioning(
                    "vm ipAddress in initialise outcome cannot be empty".to_string(),
                ));
            }
            StageInfraDetails::hosted_vm(
                pool_id,
                ip_address,
                working_dir,
                volume_mounts.clone(),
                infra_info,
                *os,
                *arch,
            )
        }
        (_, Some(_)) => Err(DispatchError::Provisioning(
            "initialise outcome infra details do not match the requested infrastructure"
                .to_string(),
        )),
        (_, None) => Err(DispatchError::Provisioning(
            "initialise outcome did not contain infra details".to_string(),
        )),
    }
}

fn provision_task(spec: &StageSpec) -> Result<TaskDescriptor, DispatchError> {
    let service_identifiers = spec
        .services
        .iter()
        .map(|s| s.identifier.clone())
        .collect::<Vec<_>>();

    let (backend, task_type, payload_namespace, payload_pool, payload_info, hosted) =
        match &spec.infra {
            InfraRequest::ContainerPod { namespace } => (
                TaskBackend::ContainerPod,
                INITIALIZE_STAGE_POD,
                namespace.clone(),
                String::new(),
                String::new(),
                false,
            ),
            InfraRequest::Vm {
                pool_id,
                infra_info,
                ..
            } => (
                TaskBackend::Vm,
                INITIALIZE_STAGE_VM,
                String::new(),
                pool_id.clone(),
                infra_info.clone(),
                false,
            ),
            InfraRequest::HostedVm {
                pool_id,
                infra_info,
                ..
            } => (
                TaskBackend::HostedVm,
                INITIALIZE_STAGE_HOSTED_VM,
                String::new(),
                pool_id.clone(),
                infra_info.clone(),
                true,
            ),
        };

    let payload = ProvisionPayload {
        stage_runtime_id: spec.stage_runtime_id.clone(),
        namespace: payload_namespace,
        pool_id: payload_pool,
        infra_info: payload_info,
        service_identifiers,
    };

    // Hosted-fleet provisioning carries decrypted secrets, same as hosted
    // step execution, so it takes the JSON path.
    let (format, bytes) = if hosted {
        let bytes = serde_json::to_vec(&payload).map_err(|e| {
            DispatchError::Provisioning(format!("failed to serialize provisioning payload: {e}"))
        })?;
        (SerializationFormat::Json, bytes)
    } else {
        (SerializationFormat::Binary, payload.encode_to_vec())
    };

    Ok(TaskDescriptor {
        backend,
        task_type: task_type.to_string(),
        format,
        payload: bytes,
        selectors: Vec::new(),
        route_to_hosted_fleet: hosted,
        timeout: spec.timeout + PROVISION_TIMEOUT_BUFFER,
        stage_runtime_id: spec.stage_runtime_id.clone(),
        step_runtime_id: spec.stage_runtime_id.clone(),
    })
}
