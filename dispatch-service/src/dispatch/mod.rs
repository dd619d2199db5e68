// Step Dispatcher
// Validates, builds, submits, and reconciles one pipeline step at a time

pub mod correlation;

pub use correlation::{CorrelationStore, PendingStep};

use std::sync::Arc;
use tracing::{debug, warn};

use crate::artifacts;
use crate::boundary::{ConnectorResolver, RawResponse, TaskSubmitter};
use crate::error::DispatchError;
use crate::models::{
    ArtifactRecord, ExecutionOutcome, ExecutionStatus, FailureKind, StageInfraDetails,
    StepDefinition, StepKind,
};
use crate::params;
use crate::reconcile;

/// Central orchestrator for step execution. Stateless per call apart from
/// the callback correlation store; safe to share across concurrent
/// dispatches because each operates on its own step/task pair.
pub struct StepDispatcher {
    submitter: Arc<dyn TaskSubmitter>,
    connectors: Arc<dyn ConnectorResolver>,
    pending: CorrelationStore,
}

impl StepDispatcher {
    pub fn new(submitter: Arc<dyn TaskSubmitter>, connectors: Arc<dyn ConnectorResolver>) -> Self {
        Self {
            submitter,
            connectors,
            pending: CorrelationStore::new(),
        }
    }

    /// Dispatch one step: validate, build the backend-specific task, submit
    /// it, and return the callback id the response will arrive under. Never
    /// blocks on execution; resumption happens via
    /// [`reconcile_on_callback`](Self::reconcile_on_callback).
    pub async fn dispatch(
        &self,
        step: &StepDefinition,
        infra: &StageInfraDetails,
    ) -> Result<String, DispatchError> {
        validate_step(step)?;
        self.resolve_connectors(step).await?;

        let task = params::build(step, infra)?;
        let callback_id = self
            .submitter
            .submit(&task)
            .await
            .map_err(|e| DispatchError::Submission(e.to_string()))?;

        self.pending.insert(
            callback_id.clone(),
            PendingStep {
                step_identifier: step.identifier.clone(),
                kind: step.kind,
                publish: step.publish.clone(),
                stage_runtime_id: step.stage_runtime_id.clone(),
                step_runtime_id: step.step_runtime_id.clone(),
            },
        );

        debug!(
            step = %step.identifier,
            callback_id = %callback_id,
            task_type = %task.task_type,
            "step submitted"
        );
        Ok(callback_id)
    }

    /// Reconcile the raw response that arrived for a callback id. Safe to
    /// invoke in any completion order; each call consumes its correlation
    /// entry exactly once.
    pub fn reconcile_on_callback(&self, callback_id: &str, raw: RawResponse) -> ExecutionOutcome {
        let Some(pending) = self.pending.take(callback_id) else {
            warn!(%callback_id, "no pending step for callback");
            return ExecutionOutcome::failed(
                format!("no pending step registered for callback id {callback_id}"),
                FailureKind::Application,
            );
        };

        let mut outcome = reconcile::reconcile(&raw);
        if outcome.status == ExecutionStatus::Succeeded && pending.kind.is_publish() {
            outcome.artifacts = self.resolve_artifacts(&pending, &raw);
        }

        debug!(
            step = %pending.step_identifier,
            %callback_id,
            status = ?outcome.status,
            "step reconciled"
        );
        outcome
    }

    /// Abort is a no-op at this layer: the remote agent owns cancellation.
    /// The pending entry is dropped so the store stays bounded.
    pub fn abort(&self, callback_id: &str) {
        if self.pending.take(callback_id).is_some() {
            debug!(%callback_id, "pending step dropped on abort");
        }
    }

    /// Number of steps still awaiting a callback
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Artifact extraction failure must never fail an otherwise-successful
    /// step: decode errors degrade to an empty artifact list.
    fn resolve_artifacts(&self, pending: &PendingStep, raw: &RawResponse) -> Vec<ArtifactRecord> {
        let Some(resolver) = artifacts::resolver_for(pending.kind) else {
            return Vec::new();
        };
        let (Some(publish), Some(descriptor)) = (&pending.publish, raw.artifact()) else {
            return Vec::new();
        };
        match resolver(descriptor, publish) {
            Ok(records) => records,
            Err(decode_error) => {
                let error = DispatchError::from(decode_error);
                warn!(
                    step = %pending.step_identifier,
                    %error,
                    "artifact metadata could not be decoded, reporting empty artifact list"
                );
                Vec::new()
            }
        }
    }

    async fn resolve_connectors(&self, step: &StepDefinition) -> Result<(), DispatchError> {
        let mut refs: Vec<&str> = Vec::new();
        if let Some(r) = step.codebase_connector_ref.as_deref() {
            refs.push(r);
        }
        if let Some(r) = step.infra_connector_ref.as_deref() {
            refs.push(r);
        }
        if let Some(r) = step.publish.as_ref().map(|p| p.connector_ref.as_str()) {
            if !r.is_empty() {
                refs.push(r);
            }
        }

        for connector_ref in refs {
            self.connectors
                .resolve(connector_ref)
                .await
                .map_err(|e| DispatchError::Validation(e.to_string()))?;
        }
        Ok(())
    }
}

/// Per-kind required-field checks. Missing-required-field is a local,
/// synchronous failure; it never reaches the remote agent.
fn validate_step(step: &StepDefinition) -> Result<(), DispatchError> {
    if step.kind.is_publish() {
        match &step.publish {
            None => {
                return Err(DispatchError::Validation(format!(
                    "publish step {} has no publish configuration",
                    step.identifier
                )));
            }
            Some(publish) if publish.repository.trim().is_empty() => {
                return Err(DispatchError::Validation(format!(
                    "repository reference cannot be empty for publish step {}",
                    step.identifier
                )));
            }
            Some(_) => {}
        }
    }

    match step.kind {
        StepKind::Run if step.command.as_deref().map_or(true, str::is_empty) => {
            Err(DispatchError::Validation(format!(
                "command cannot be empty for run step {}",
                step.identifier
            )))
        }
        StepKind::Plugin if step.image.as_deref().map_or(true, str::is_empty) => {
            Err(DispatchError::Validation(format!(
                "image cannot be empty for plugin step {}",
                step.identifier
            )))
        }
        StepKind::GitClone
            if step.codebase_connector_ref.as_deref().map_or(true, str::is_empty) =>
        {
            Err(DispatchError::Validation(format!(
                "codebase connector reference cannot be empty for git clone step {}",
                step.identifier
            )))
        }
        _ => Ok(()),
    }
}
