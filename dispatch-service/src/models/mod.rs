// Data Models
// Core types shared by the dispatch pipeline

pub mod infra;
pub mod outcome;
pub mod step;
pub mod task;

pub use infra::{ArchType, OsType, StageInfraDetails};
pub use outcome::{
    ArtifactKind, ArtifactRecord, DependencyState, DependencyStatus, ExecutionOutcome,
    ExecutionStatus, FailureKind,
};
pub use step::{PublishConfig, StepDefinition, StepKind};
pub use task::{
    HostedVmTaskEnvelope, PodTaskPayload, ProvisionPayload, SerializationFormat, TaskBackend,
    TaskDescriptor, VmTaskPayload,
};
