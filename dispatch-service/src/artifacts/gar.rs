// Google Artifact Registry Artifact Resolver

use crate::artifacts::gcr::GLOBAL_REGION;
use crate::artifacts::{split_image_tag, strip_scheme, ImagePushed};
use crate::error::DecodeError;
use crate::models::{ArtifactKind, ArtifactRecord, PublishConfig};

/// Resolve a GAR push. The region is parsed from the registry host, which
/// matches `(region.)?docker.pkg.dev` (regional hosts separate the region
/// with either `.` or `-`).
pub fn resolve(
    pushed: &ImagePushed,
    _config: &PublishConfig,
) -> Result<Vec<ArtifactRecord>, DecodeError> {
    let (full, tag) = split_image_tag(&pushed.image);
    let host = strip_scheme(&pushed.registry_host);
    let region = region_from_host(host)?;

    let image = full
        .strip_prefix(host)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(&full);
    let project = image.split('/').next().unwrap_or_default();

    let console_url = pushed.digest.as_ref().map(|digest| {
        format!(
            "https://console.cloud.google.com/artifacts/docker/{project}/{region}/{image}@{digest}?project={project}"
        )
    });

    Ok(vec![ArtifactRecord {
        image_name: image.to_string(),
        tag,
        digest: pushed.digest.clone(),
        console_url,
        kind: ArtifactKind::Image,
    }])
}

fn region_from_host(host: &str) -> Result<String, DecodeError> {
    let host = host.trim_end_matches('/');
    if host == "docker.pkg.dev" {
        return Ok(GLOBAL_REGION.to_string());
    }
    host.strip_suffix("-docker.pkg.dev")
        .or_else(|| host.strip_suffix(".docker.pkg.dev"))
        .map(str::to_uppercase)
        .ok_or_else(|| {
            DecodeError::new(format!(
                "registry host does not match (region.)?docker.pkg.dev: {host}"
            ))
        })
}
