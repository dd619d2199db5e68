// Response Reconciler
// Normalizes heterogeneous raw agent responses into one ExecutionOutcome

use std::collections::HashMap;
use tracing::warn;

use crate::boundary::{CommandStatus, RawResponse};
use crate::error::DispatchError;
use crate::models::{ExecutionOutcome, FailureKind};

/// Reconcile one raw agent response. A submitted step moves to exactly one
/// terminal state; reconciliation is commutative across completion order
/// and never retries.
pub fn reconcile(raw: &RawResponse) -> ExecutionOutcome {
    let (status, error_message, outputs, provenance) = match raw {
        RawResponse::ContainerPod(r) => (r.status, &r.error_message, &r.outputs, &r.provenance),
        RawResponse::Vm(r) => (r.status, &r.error_message, &r.outputs, &r.provenance),
        RawResponse::Unrecognized { detail } => {
            let error = DispatchError::MalformedResponse(format!(
                "unexpected response type in callback payload: {detail}"
            ));
            return ExecutionOutcome::failed(error.to_string(), FailureKind::Application);
        }
    };

    match status {
        CommandStatus::Success => {
            let mut outcome = ExecutionOutcome::succeeded().with_outputs(extract_outputs(outputs));
            if let Some(predicate) = provenance {
                outcome = outcome.with_provenance(predicate.clone());
            }
            outcome
        }
        CommandStatus::Skipped => ExecutionOutcome::skipped(),
        // Failure, timeout, and anything else the agent may report: attach
        // the agent's message verbatim, or empty when it sent none.
        _ => ExecutionOutcome::failed(error_message.clone(), FailureKind::Remote),
    }
}

/// Extract the output-variable map from the raw JSON the agent reported.
/// Extraction never fails the step: malformed payloads are logged and
/// degrade to an empty map.
fn extract_outputs(raw: &Option<serde_json::Value>) -> HashMap<String, String> {
    let Some(value) = raw else {
        return HashMap::new();
    };
    match try_extract_outputs(value) {
        Ok(outputs) => outputs,
        Err(message) => {
            warn!(%message, "failed to extract output variables, continuing without them");
            HashMap::new()
        }
    }
}

fn try_extract_outputs(value: &serde_json::Value) -> Result<HashMap<String, String>, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("output payload is not an object: {value}"))?;

    let mut outputs = HashMap::with_capacity(object.len());
    for (key, entry) in object {
        let text = entry
            .as_str()
            .ok_or_else(|| format!("output variable {key} is not a string: {entry}"))?;
        outputs.insert(key.clone(), text.to_string());
    }
    Ok(outputs)
}
