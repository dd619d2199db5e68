// Hosted VM Payload Builder
// Wraps the VM payload in a host-fleet envelope serialized as JSON

use std::collections::HashMap;

use crate::error::DispatchError;
use crate::models::{
    ArchType, HostedVmTaskEnvelope, OsType, SerializationFormat, StepDefinition, TaskBackend,
    TaskDescriptor,
};
use crate::params::{vm::vm_payload, EXECUTE_STEP_HOSTED_VM};

/// Platform selector string for hosted-fleet routing, e.g. `linux-amd64`
pub fn platform_selector(os: OsType, arch: ArchType) -> String {
    format!("{}-{}", os.token(), arch.token())
}

/// Build a hosted-fleet VM execution task. Secrets in this payload are
/// pre-decrypted, so JSON serialization is mandatory; the binary path must
/// not carry it.
#[allow(clippy::too_many_arguments)]
pub fn build(
    step: &StepDefinition,
    pool_id: &str,
    ip_address: &str,
    working_dir: &str,
    volume_mounts: &HashMap<String, String>,
    infra_info: &str,
    os: OsType,
    arch: ArchType,
) -> Result<TaskDescriptor, DispatchError> {
    let platform = platform_selector(os, arch);
    let envelope = HostedVmTaskEnvelope {
        vm: vm_payload(step, pool_id, ip_address, working_dir, volume_mounts, infra_info),
        platform: platform.clone(),
        pool_id: pool_id.to_string(),
        secrets_decrypted: true,
    };

    let payload = serde_json::to_vec(&envelope).map_err(|e| {
        DispatchError::Submission(format!("failed to serialize hosted vm payload: {e}"))
    })?;

    let mut selectors = step.deploy_targets.clone();
    selectors.push(platform);

    Ok(TaskDescriptor {
        backend: TaskBackend::HostedVm,
        task_type: EXECUTE_STEP_HOSTED_VM.to_string(),
        format: SerializationFormat::Json,
        payload,
        selectors,
        route_to_hosted_fleet: true,
        timeout: step.timeout,
        stage_runtime_id: step.stage_runtime_id.clone(),
        step_runtime_id: step.step_runtime_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepKind;

    #[test]
    fn test_hosted_task_is_json_with_platform_selector() {
        let step = StepDefinition::new("build", StepKind::Run, "stage-rt", "step-rt")
            .with_command("make");

        let task = build(
            &step,
            "hosted-pool",
            "10.2.3.4",
            "/harness",
            &HashMap::new(),
            "hosted",
            OsType::Linux,
            ArchType::Arm64,
        )
        .unwrap();

        assert!(task.route_to_hosted_fleet);
        assert_eq!(task.format, SerializationFormat::Json);
        assert!(task.selectors.contains(&"linux-arm64".to_string()));

        let envelope: HostedVmTaskEnvelope = serde_json::from_slice(&task.payload).unwrap();
        assert!(envelope.secrets_decrypted);
        assert_eq!(envelope.platform, "linux-arm64");
        assert_eq!(envelope.vm.pool_id, "hosted-pool");
        assert_eq!(envelope.vm.ip_address, "10.2.3.4");
    }

    #[test]
    fn test_platform_selector_tokens() {
        assert_eq!(platform_selector(OsType::Windows, ArchType::Amd64), "windows-amd64");
        assert_eq!(platform_selector(OsType::Macos, ArchType::Arm64), "macos-arm64");
    }
}
