// Docker Hub Artifact Resolver

use crate::artifacts::{split_image_tag, strip_scheme, ImagePushed};
use crate::error::DecodeError;
use crate::models::{ArtifactKind, ArtifactRecord, PublishConfig};

/// Public Docker Hub registry host. Only pushes to this host get a console
/// URL; private registries speaking the Docker protocol have no known one.
const DOCKER_HUB_HOST: &str = "index.docker.io";

/// Resolve a Docker push. The image path is kept as reported; nothing is
/// stripped from it.
pub fn resolve(
    pushed: &ImagePushed,
    _config: &PublishConfig,
) -> Result<Vec<ArtifactRecord>, DecodeError> {
    let (image, tag) = split_image_tag(&pushed.image);

    let console_url = if strip_scheme(&pushed.registry_host).contains(DOCKER_HUB_HOST) {
        pushed.digest.as_ref().map(|digest| {
            format!(
                "https://hub.docker.com/layers/{image}/{tag}/images/{image}/{tag}/{}/",
                digest.replace(':', "-")
            )
        })
    } else {
        None
    };

    Ok(vec![ArtifactRecord {
        image_name: image,
        tag,
        digest: pushed.digest.clone(),
        console_url,
        kind: ArtifactKind::Image,
    }])
}
