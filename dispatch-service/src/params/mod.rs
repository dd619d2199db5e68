// Task Parameter Builder
// Builds backend-specific task payloads from a step and its stage infra

pub mod hosted;
pub mod pod;
pub mod vm;

use crate::error::DispatchError;
use crate::models::{StageInfraDetails, StepDefinition, TaskDescriptor};

/// Task type routed to the agent for container-pod step execution
pub const EXECUTE_STEP_POD: &str = "EXECUTE_STEP_POD";
/// Task type routed to the agent for self-managed VM step execution
pub const EXECUTE_STEP_VM: &str = "EXECUTE_STEP_VM";
/// Task type routed to the hosted fleet for VM step execution
pub const EXECUTE_STEP_HOSTED_VM: &str = "EXECUTE_STEP_HOSTED_VM";

/// Build the task descriptor for one step. The builder variant is selected
/// strictly by the infra tag; the match is exhaustive so a new backend
/// cannot be added without a builder.
pub fn build(
    step: &StepDefinition,
    infra: &StageInfraDetails,
) -> Result<TaskDescriptor, DispatchError> {
    validate_target_selection(step)?;

    match infra {
        StageInfraDetails::ContainerPod {
            ip_address,
            namespace,
        } => pod::build(step, ip_address, namespace),
        StageInfraDetails::Vm {
            pool_id,
            ip_address,
            working_dir,
            volume_mounts,
            infra_info,
        } => vm::build(step, pool_id, ip_address, working_dir, volume_mounts, infra_info),
        StageInfraDetails::HostedVm {
            pool_id,
            ip_address,
            working_dir,
            volume_mounts,
            infra_info,
            os,
            arch,
        } => hosted::build(
            step,
            pool_id,
            ip_address,
            working_dir,
            volume_mounts,
            infra_info,
            // A step may request its own platform; the infra's is the
            // stage-wide default.
            step.os.unwrap_or(*os),
            step.arch.unwrap_or(*arch),
        ),
    }
}

/// "Apply to everything" together with an explicit allow-list is a
/// configuration error; failing fast beats silently picking one.
fn validate_target_selection(step: &StepDefinition) -> Result<(), DispatchError> {
    if step.deploy_to_all && !step.deploy_targets.is_empty() {
        return Err(DispatchError::Validation(format!(
            "step {} sets deployToAll together with an explicit target list; the options are mutually exclusive",
            step.identifier
        )));
    }
    Ok(())
}
