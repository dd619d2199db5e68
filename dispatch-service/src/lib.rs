// Dispatch Service Library
// Converts declarative CI pipeline steps into remote-agent tasks and
// reconciles the asynchronous responses into uniform step outcomes

pub mod artifacts;
pub mod boundary;
pub mod dependencies;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod params;
pub mod reconcile;
pub mod stage;

// Re-export commonly used types
pub use error::{DecodeError, DispatchError};

// Re-export model types
pub use models::{
    ArchType, ArtifactKind, ArtifactRecord, DependencyState, DependencyStatus, ExecutionOutcome,
    ExecutionStatus, FailureKind, OsType, PublishConfig, SerializationFormat, StageInfraDetails,
    StepDefinition, StepKind, TaskBackend, TaskDescriptor,
};

// Re-export boundary types
pub use boundary::{
    CommandStatus, ConnectorDetails, ConnectorError, ConnectorResolver, PodStepResponse,
    ProvisionResponse, ProvisionedInfra, RawResponse, ServiceHealth, SubmitError, TaskSubmitter,
    VmStepResponse,
};

// Re-export dispatch types
pub use dispatch::{CorrelationStore, PendingStep, StepDispatcher};

// Re-export artifact types
pub use artifacts::{resolver_for, ImagePushed, ResolverFn};

// Re-export stage types
pub use dependencies::{build_dependency_outcomes, ServiceDefinition};
pub use stage::{
    InfraRequest, StageInitializer, StageOutcome, StageSpec, PROVISION_TIMEOUT_BUFFER,
};
