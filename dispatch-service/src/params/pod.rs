// Container Pod Payload Builder

use prost::Message;

use crate::error::DispatchError;
use crate::models::{
    PodTaskPayload, SerializationFormat, StepDefinition, StepKind, TaskBackend, TaskDescriptor,
};
use crate::params::EXECUTE_STEP_POD;

/// Build a pod execution task. The payload targets the stage's pod by IP
/// and namespace and is serialized with the native binary codec.
pub fn build(
    step: &StepDefinition,
    ip_address: &str,
    namespace: &str,
) -> Result<TaskDescriptor, DispatchError> {
    let payload = PodTaskPayload {
        step_identifier: step.identifier.clone(),
        ip_address: ip_address.to_string(),
        namespace: namespace.to_string(),
        image: step.image.clone().unwrap_or_default(),
        command: step.command.clone().unwrap_or_default(),
        env: step.env.clone(),
        timeout_secs: step.timeout.as_secs(),
        detach: step.kind == StepKind::Background,
    };

    Ok(TaskDescriptor {
        backend: TaskBackend::ContainerPod,
        task_type: EXECUTE_STEP_POD.to_string(),
        format: SerializationFormat::Binary,
        payload: payload.encode_to_vec(),
        selectors: step.deploy_targets.clone(),
        route_to_hosted_fleet: false,
        timeout: step.timeout,
        stage_runtime_id: step.stage_runtime_id.clone(),
        step_runtime_id: step.step_runtime_id.clone(),
    })
}
