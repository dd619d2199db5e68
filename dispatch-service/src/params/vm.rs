// Self-Managed VM Payload Builder

use prost::Message;
use std::collections::HashMap;

use crate::error::DispatchError;
use crate::models::{
    SerializationFormat, StepDefinition, TaskBackend, TaskDescriptor, VmTaskPayload,
};
use crate::params::EXECUTE_STEP_VM;

/// Assemble the VM payload shared by the self-managed and hosted paths
pub(crate) fn vm_payload(
    step: &StepDefinition,
    pool_id: &str,
    ip_address: &str,
    working_dir: &str,
    volume_mounts: &HashMap<String, String>,
    infra_info: &str,
) -> VmTaskPayload {
    VmTaskPayload {
        step_identifier: step.identifier.clone(),
        ip_address: ip_address.to_string(),
        pool_id: pool_id.to_string(),
        working_dir: working_dir.to_string(),
        volume_mounts: volume_mounts.clone(),
        infra_info: infra_info.to_string(),
        image: step.image.clone().unwrap_or_default(),
        command: step.command.clone().unwrap_or_default(),
        env: step.env.clone(),
        timeout_secs: step.timeout.as_secs(),
    }
}

/// Build a self-managed VM execution task, serialized with the native
/// binary codec.
pub fn build(
    step: &StepDefinition,
    pool_id: &str,
    ip_address: &str,
    working_dir: &str,
    volume_mounts: &HashMap<String, String>,
    infra_info: &str,
) -> Result<TaskDescriptor, DispatchError> {
    let payload = vm_payload(step, pool_id, ip_address, working_dir, volume_mounts, infra_info);

    Ok(TaskDescriptor {
        backend: TaskBackend::Vm,
        task_type: EXECUTE_STEP_VM.to_string(),
        format: SerializationFormat::Binary,
        payload: payload.encode_to_vec(),
        selectors: step.deploy_targets.clone(),
        route_to_hosted_fleet: false,
        timeout: step.timeout,
        stage_runtime_id: step.stage_runtime_id.clone(),
        step_runtime_id: step.step_runtime_id.clone(),
    })
}
