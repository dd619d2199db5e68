// Step Definition Models
// Declarative description of one executable pipeline step

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::models::infra::{ArchType, OsType};

/// The kind of work a step performs. Adding a kind means extending this
/// enum and the kind → builder/resolver tables that match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    /// Generic command execution
    Run,
    /// Long-lived service container started before dependent steps
    Background,
    /// Prebuilt plugin image with settings passed as environment
    Plugin,
    /// Build and push to Docker Hub (or a compatible registry)
    PublishDocker,
    /// Build and push to AWS Elastic Container Registry
    PublishEcr,
    /// Build and push to Google Container Registry
    PublishGcr,
    /// Build and push to Google Artifact Registry
    PublishGar,
    /// Build and push to Azure Container Registry
    PublishAcr,
    /// Test execution with report collection
    RunTests,
    /// Security / vulnerability scan
    Security,
    /// Repository checkout
    GitClone,
}

impl StepKind {
    /// Whether this kind publishes an image to a registry and therefore
    /// participates in artifact resolution after a successful response.
    pub fn is_publish(&self) -> bool {
        matches!(
            self,
            StepKind::PublishDocker
                | StepKind::PublishEcr
                | StepKind::PublishGcr
                | StepKind::PublishGar
                | StepKind::PublishAcr
        )
    }
}

/// Registry-publish configuration carried by publish step kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    /// Target repository reference. Required for every publish kind.
    pub repository: String,

    /// Registry host or login server (e.g. `us.gcr.io`,
    /// `myregistry.azurecr.io`)
    pub registry_host: String,

    /// Registry connector reference resolved before dispatch
    pub connector_ref: String,

    /// Tags to apply to the pushed image
    #[serde(default)]
    pub tags: Vec<String>,

    /// Build arguments forwarded to the image build
    #[serde(default)]
    pub build_args: HashMap<String, String>,

    /// Azure subscription identifier. Optional for backward compatibility
    /// with step configurations predating the field; the ACR resolver is a
    /// no-op without it.
    pub subscription_id: Option<String>,

    /// Folder within the ACR repository, when the portal link should point
    /// below the repository root
    pub folder: Option<String>,
}

/// One executable unit inside a pipeline stage. Immutable once dispatch
/// begins; the dispatcher only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    /// Step identifier, unique within the stage
    pub identifier: String,

    /// Display name
    pub name: Option<String>,

    /// What the step does
    pub kind: StepKind,

    /// Step-declared execution timeout
    pub timeout: Duration,

    /// Container image to run (plugin and container-backed steps)
    pub image: Option<String>,

    /// Command to execute (run-style steps)
    pub command: Option<String>,

    /// Environment passed to the step
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Git codebase connector reference (clone steps)
    pub codebase_connector_ref: Option<String>,

    /// Infrastructure connector reference
    pub infra_connector_ref: Option<String>,

    /// Registry-publish configuration (publish kinds only)
    pub publish: Option<PublishConfig>,

    /// Run on every available target. Mutually exclusive with
    /// `deploy_targets`.
    #[serde(default)]
    pub deploy_to_all: bool,

    /// Explicit target allow-list, forwarded as routing selectors
    #[serde(default)]
    pub deploy_targets: Vec<String>,

    /// Requested operating system for hosted-fleet routing; overrides the
    /// infra's stage-wide default when set
    pub os: Option<OsType>,

    /// Requested architecture for hosted-fleet routing; overrides the
    /// infra's stage-wide default when set
    pub arch: Option<ArchType>,

    /// Runtime id of the enclosing stage, used for callback correlation
    pub stage_runtime_id: String,

    /// Runtime id of this step, unique per invocation
    pub step_runtime_id: String,
}

impl StepDefinition {
    /// Create a step of the given kind with required identifiers and a
    /// default one-hour timeout
    pub fn new(
        identifier: impl Into<String>,
        kind: StepKind,
        stage_runtime_id: impl Into<String>,
        step_runtime_id: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            kind,
            timeout: Duration::from_secs(3600),
            image: None,
            command: None,
            env: HashMap::new(),
            codebase_connector_ref: None,
            infra_connector_ref: None,
            publish: None,
            deploy_to_all: false,
            deploy_targets: Vec::new(),
            os: None,
            arch: None,
            stage_runtime_id: stage_runtime_id.into(),
            step_runtime_id: step_runtime_id.into(),
        }
    }

    /// Set the step timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the container image
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the command to execute
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the publish configuration
    pub fn with_publish(mut self, publish: PublishConfig) -> Self {
        self.publish = Some(publish);
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}
