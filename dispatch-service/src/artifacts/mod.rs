// Artifact Resolver Registry
// Pure per-registry mappings from pushed-image metadata to canonical records

pub mod acr;
pub mod docker;
pub mod ecr;
pub mod gar;
pub mod gcr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::models::{ArtifactRecord, PublishConfig, StepKind};

/// Registry-agnostic "image pushed" descriptor reported by the remote agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePushed {
    /// Image reference, possibly carrying a tag as `name:tag`
    pub image: String,
    /// Content digest, e.g. `sha256:abcd`. Absent when the agent could not
    /// report one.
    pub digest: Option<String>,
    /// Registry host the image was pushed to
    pub registry_host: String,
}

/// A resolver maps one pushed-image descriptor plus the step's publish
/// configuration into canonical artifact records. Resolvers are pure: same
/// inputs, same records, no side effects.
pub type ResolverFn = fn(&ImagePushed, &PublishConfig) -> Result<Vec<ArtifactRecord>, DecodeError>;

/// Look up the resolver for a step kind. Adding a publish kind means adding
/// a row here.
pub fn resolver_for(kind: StepKind) -> Option<ResolverFn> {
    match kind {
        StepKind::PublishDocker => Some(docker::resolve),
        StepKind::PublishEcr => Some(ecr::resolve),
        StepKind::PublishGcr => Some(gcr::resolve),
        StepKind::PublishGar => Some(gar::resolve),
        StepKind::PublishAcr => Some(acr::resolve),
        _ => None,
    }
}

/// Split an image reference into `(image, tag)`. The tag is the last
/// `:`-separated segment after the final path separator; references without
/// a tag default to `latest`. A colon inside the host port (before the last
/// `/`) is not a tag separator.
pub(crate) fn split_image_tag(reference: &str) -> (String, String) {
    let last_slash = reference.rfind('/');
    match reference.rfind(':') {
        Some(idx) if last_slash.map_or(true, |slash| idx > slash) => (
            reference[..idx].to_string(),
            reference[idx + 1..].to_string(),
        ),
        _ => (reference.to_string(), "latest".to_string()),
    }
}

/// Strip a `scheme://` prefix from a registry host, if present
pub(crate) fn strip_scheme(host: &str) -> &str {
    host.strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
}
