// Dispatch Flow Integration Tests
// Full dispatch → callback → reconcile cycles against in-memory collaborators

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dispatch_service::{
    CommandStatus, ConnectorDetails, ConnectorError, ConnectorResolver, DispatchError,
    ExecutionStatus, FailureKind, ImagePushed, PodStepResponse, PublishConfig, RawResponse,
    SerializationFormat, StageInfraDetails, StepDefinition, StepDispatcher, StepKind, SubmitError,
    TaskDescriptor, TaskSubmitter, VmStepResponse,
};

/// Submitter that records every task and hands out sequential callback ids
struct RecordingSubmitter {
    tasks: Mutex<Vec<TaskDescriptor>>,
}

impl RecordingSubmitter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            tasks: Mutex::new(Vec::new()),
        })
    }

    fn submitted(&self) -> Vec<TaskDescriptor> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskSubmitter for RecordingSubmitter {
    async fn submit(&self, task: &TaskDescriptor) -> Result<String, SubmitError> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(task.clone());
        Ok(format!("cb-{}", tasks.len()))
    }
}

/// Submitter whose transport always fails
struct FailingSubmitter;

#[async_trait]
impl TaskSubmitter for FailingSubmitter {
    async fn submit(&self, _task: &TaskDescriptor) -> Result<String, SubmitError> {
        Err(SubmitError("broker unreachable".to_string()))
    }
}

/// Connector resolver that accepts every reference
struct AllowAllConnectors;

#[async_trait]
impl ConnectorResolver for AllowAllConnectors {
    async fn resolve(&self, connector_ref: &str) -> Result<ConnectorDetails, ConnectorError> {
        Ok(ConnectorDetails {
            identifier: connector_ref.to_string(),
            url: None,
            credentials_ref: None,
        })
    }
}

/// Connector resolver that rejects every reference
struct RejectingConnectors;

#[async_trait]
impl ConnectorResolver for RejectingConnectors {
    async fn resolve(&self, connector_ref: &str) -> Result<ConnectorDetails, ConnectorError> {
        Err(ConnectorError {
            connector_ref: connector_ref.to_string(),
            message: "not authorized".to_string(),
        })
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn dispatcher(submitter: Arc<dyn TaskSubmitter>) -> StepDispatcher {
    init_tracing();
    StepDispatcher::new(submitter, Arc::new(AllowAllConnectors))
}

fn run_step(id: &str) -> StepDefinition {
    StepDefinition::new(id, StepKind::Run, "stage-rt", format!("{id}-rt"))
        .with_command("make build")
        .with_timeout(Duration::from_secs(120))
}

fn pod_infra() -> StageInfraDetails {
    StageInfraDetails::container_pod("10.1.2.3", "ci")
}

fn success_response(outputs: Option<serde_json::Value>) -> RawResponse {
    RawResponse::ContainerPod(PodStepResponse {
        status: CommandStatus::Success,
        error_message: String::new(),
        outputs,
        artifact: None,
        provenance: None,
    })
}

#[tokio::test]
async fn dispatch_returns_callback_id_without_blocking() {
    let submitter = RecordingSubmitter::new();
    let dispatcher = dispatcher(submitter.clone());

    let callback_id = dispatcher
        .dispatch(&run_step("build"), &pod_infra())
        .await
        .unwrap();
    assert_eq!(callback_id, "cb-1");
    assert_eq!(dispatcher.pending_count(), 1);

    let tasks = submitter.submitted();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].format, SerializationFormat::Binary);
    assert!(!tasks[0].route_to_hosted_fleet);
    assert_eq!(tasks[0].timeout, Duration::from_secs(120));
}

#[tokio::test]
async fn callbacks_reconcile_in_any_arrival_order() {
    let dispatcher = dispatcher(RecordingSubmitter::new());

    let cb_a = dispatcher
        .dispatch(&run_step("a"), &pod_infra())
        .await
        .unwrap();
    let cb_b = dispatcher
        .dispatch(&run_step("b"), &pod_infra())
        .await
        .unwrap();
    assert_eq!(dispatcher.pending_count(), 2);

    // B completes before A.
    let outcome_b = dispatcher.reconcile_on_callback(
        &cb_b,
        success_response(Some(serde_json::json!({"STEP": "b"}))),
    );
    let outcome_a = dispatcher.reconcile_on_callback(
        &cb_a,
        RawResponse::Vm(VmStepResponse {
            status: CommandStatus::Failure,
            error_message: "exit code 3".to_string(),
            outputs: None,
            artifact: None,
            provenance: None,
        }),
    );

    assert_eq!(outcome_b.status, ExecutionStatus::Succeeded);
    assert_eq!(outcome_b.outputs.get("STEP").map(String::as_str), Some("b"));
    assert_eq!(outcome_a.status, ExecutionStatus::Failed);
    assert_eq!(outcome_a.error_message.as_deref(), Some("exit code 3"));
    assert_eq!(dispatcher.pending_count(), 0);
}

#[tokio::test]
async fn publish_success_resolves_artifacts() {
    let dispatcher = dispatcher(RecordingSubmitter::new());

    let step = StepDefinition::new("push", StepKind::PublishGcr, "stage-rt", "push-rt")
        .with_publish(PublishConfig {
            repository: "proj/app".to_string(),
            registry_host: "us.gcr.io".to_string(),
            connector_ref: "account.gcp".to_string(),
            ..PublishConfig::default()
        });

    let callback_id = dispatcher.dispatch(&step, &pod_infra()).await.unwrap();
    let outcome = dispatcher.reconcile_on_callback(
        &callback_id,
        RawResponse::ContainerPod(PodStepResponse {
            status: CommandStatus::Success,
            error_message: String::new(),
            outputs: None,
            artifact: Some(ImagePushed {
                image: "us.gcr.io/proj/app:v1".to_string(),
                digest: Some("sha256:deadbeef".to_string()),
                registry_host: "us.gcr.io".to_string(),
            }),
            provenance: None,
        }),
    );

    assert_eq!(outcome.status, ExecutionStatus::Succeeded);
    assert_eq!(outcome.artifacts.len(), 1);
    assert_eq!(outcome.artifacts[0].image_name, "proj/app");
    assert_eq!(
        outcome.artifacts[0].console_url.as_deref(),
        Some("https://console.cloud.google.com/gcr/images/proj/US/proj/app@sha256:deadbeef/details")
    );
}

#[tokio::test]
async fn artifact_decode_failure_never_fails_the_step() {
    let dispatcher = dispatcher(RecordingSubmitter::new());

    let step = StepDefinition::new("push", StepKind::PublishEcr, "stage-rt", "push-rt")
        .with_publish(PublishConfig {
            repository: "svc".to_string(),
            registry_host: "123.dkr.ecr.us-east-1.amazonaws.com".to_string(),
            connector_ref: "account.aws".to_string(),
            ..PublishConfig::default()
        });

    let callback_id = dispatcher.dispatch(&step, &pod_infra()).await.unwrap();
    let outcome = dispatcher.reconcile_on_callback(
        &callback_id,
        RawResponse::ContainerPod(PodStepResponse {
            status: CommandStatus::Success,
            error_message: String::new(),
            outputs: None,
            // No registry host in the reference, so ECR decoding fails.
            artifact: Some(ImagePushed {
                image: "svc:1.2.3".to_string(),
                digest: None,
                registry_host: String::new(),
            }),
            provenance: None,
        }),
    );

    assert_eq!(outcome.status, ExecutionStatus::Succeeded);
    assert!(outcome.artifacts.is_empty());
}

#[tokio::test]
async fn missing_repository_is_rejected_before_submission() {
    let submitter = RecordingSubmitter::new();
    let dispatcher = dispatcher(submitter.clone());

    let step = StepDefinition::new("push", StepKind::PublishDocker, "stage-rt", "push-rt");
    let err = dispatcher.dispatch(&step, &pod_infra()).await.unwrap_err();

    assert!(matches!(err, DispatchError::Validation(_)));
    assert!(submitter.submitted().is_empty());
    assert_eq!(dispatcher.pending_count(), 0);
}

#[tokio::test]
async fn connector_rejection_is_a_validation_error() {
    let submitter = RecordingSubmitter::new();
    let dispatcher = StepDispatcher::new(submitter.clone(), Arc::new(RejectingConnectors));

    let mut step = run_step("clone");
    step.kind = StepKind::GitClone;
    step.command = None;
    step.codebase_connector_ref = Some("account.github".to_string());

    let err = dispatcher.dispatch(&step, &pod_infra()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Validation(_)));
    assert!(err.to_string().contains("account.github"));
    assert!(submitter.submitted().is_empty());
}

#[tokio::test]
async fn transport_failure_surfaces_as_submission_error() {
    let dispatcher = dispatcher(Arc::new(FailingSubmitter));
    let err = dispatcher
        .dispatch(&run_step("build"), &pod_infra())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Submission(_)));
    assert!(err.to_string().contains("broker unreachable"));
    assert_eq!(dispatcher.pending_count(), 0);
}

#[tokio::test]
async fn unknown_callback_is_a_defensive_failure() {
    let dispatcher = dispatcher(RecordingSubmitter::new());
    let outcome = dispatcher.reconcile_on_callback("cb-never-issued", success_response(None));
    assert_eq!(outcome.status, ExecutionStatus::Failed);
    assert_eq!(outcome.failure_kind, Some(FailureKind::Application));
}

#[tokio::test]
async fn abort_is_a_quiet_no_op() {
    let dispatcher = dispatcher(RecordingSubmitter::new());
    let callback_id = dispatcher
        .dispatch(&run_step("build"), &pod_infra())
        .await
        .unwrap();

    dispatcher.abort(&callback_id);
    assert_eq!(dispatcher.pending_count(), 0);

    // Aborting an unknown id must not panic or block either.
    dispatcher.abort("cb-unknown");
}

#[tokio::test]
async fn hosted_infra_routes_to_the_fleet() {
    let submitter = RecordingSubmitter::new();
    let dispatcher = dispatcher(submitter.clone());

    let infra = StageInfraDetails::hosted_vm(
        "hosted-pool",
        "10.9.8.7",
        "/harness",
        HashMap::new(),
        "hosted",
        dispatch_service::OsType::Linux,
        dispatch_service::ArchType::Amd64,
    )
    .unwrap();

    dispatcher
        .dispatch(&run_step("build"), &infra)
        .await
        .unwrap();

    let tasks = submitter.submitted();
    assert!(tasks[0].route_to_hosted_fleet);
    assert_eq!(tasks[0].format, SerializationFormat::Json);
    assert!(tasks[0].selectors.contains(&"linux-amd64".to_string()));
}
