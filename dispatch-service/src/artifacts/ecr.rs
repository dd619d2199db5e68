// AWS ECR Artifact Resolver

use crate::artifacts::{split_image_tag, ImagePushed};
use crate::error::DecodeError;
use crate::models::{ArtifactKind, ArtifactRecord, PublishConfig};

/// Resolve an ECR push. The registry host prefix is stripped from the image
/// name; account and region are parsed from the host, which has the shape
/// `{account}.dkr.ecr.{region}.amazonaws.com`.
pub fn resolve(
    pushed: &ImagePushed,
    _config: &PublishConfig,
) -> Result<Vec<ArtifactRecord>, DecodeError> {
    let (full, tag) = split_image_tag(&pushed.image);

    let (host, image) = full.split_once('/').ok_or_else(|| {
        DecodeError::new(format!("ecr image reference has no registry host: {full}"))
    })?;

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() != 6 || labels[1] != "dkr" || labels[2] != "ecr" {
        return Err(DecodeError::new(format!(
            "registry host does not match {{account}}.dkr.ecr.{{region}}.amazonaws.com: {host}"
        )));
    }
    let account = labels[0];
    let region = labels[3];

    let console_url = pushed.digest.as_ref().map(|digest| {
        format!(
            "https://console.aws.amazon.com/ecr/repositories/private/{account}/{image}/image/{digest}/details/?region={region}"
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
