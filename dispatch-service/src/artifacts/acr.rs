// Azure Container Registry Artifact Resolver

use tracing::debug;

use crate::artifacts::{split_image_tag, strip_scheme, ImagePushed};
use crate::error::DecodeError;
use crate::models::{ArtifactKind, ArtifactRecord, PublishConfig};

/// Resolve an ACR push. Unlike the other registries the console link is a
/// portal deep link built from the repository, the folder within it, the
/// tag, and the login server; the digest is recorded but not linked.
///
/// Step configurations predating the `subscription_id` field resolve to an
/// empty artifact list instead of an error.
pub fn resolve(
    pushed: &ImagePushed,
    config: &PublishConfig,
) -> Result<Vec<ArtifactRecord>, DecodeError> {
    let Some(subscription) = config
        .subscription_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    else {
        debug!(
            repository = %config.repository,
            "acr publish has no subscription id, skipping artifact resolution"
        );
        return Ok(Vec::new());
    };

    let (image, tag) = split_image_tag(&pushed.image);
    let login_server = strip_scheme(&pushed.registry_host).trim_end_matches('/');

    let repository_path = match config.folder.as_deref().filter(|f| !f.is_empty()) {
        Some(folder) => format!("{}/{}", config.repository, folder),
        None => config.repository.clone(),
    };

    let console_url = format!(
        "https://portal.azure.com/#blade/Microsoft_Azure_ContainerRegistries/TagMetadataBlade/subscriptionId/{subscription}/registry/{login_server}/repository/{repository_path}/tag/{tag}"
    );

    Ok(vec![ArtifactRecord {
        image_name: image,
        tag,
        digest: pushed.digest.clone(),
        console_url: Some(console_url),
        kind: ArtifactKind::Image,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(subscription: Option<&str>, folder: Option<&str>) -> PublishConfig {
        PublishConfig {
            repository: "team/app".to_string(),
            registry_host: "myregistry.azurecr.io".to_string(),
            subscription_id: subscription.map(str::to_string),
            folder: folder.map(str::to_string),
            ..PublishConfig::default()
        }
    }

    fn pushed() -> ImagePushed {
        ImagePushed {
            image: "myregistry.azurecr.io/team/app:v3".to_string(),
            digest: Some("sha256:abcd".to_string()),
            registry_host: "myregistry.azurecr.io".to_string(),
        }
    }

    #[test]
    fn test_missing_subscription_id_yields_empty_list() {
        let records = resolve(&pushed(), &config(None, None)).unwrap();
        assert!(records.is_empty());

        let records = resolve(&pushed(), &config(Some("  "), None)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_portal_deep_link() {
        let records = resolve(&pushed(), &config(Some("sub-123"), Some("backend"))).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].console_url.as_deref(),
            Some(
                "https://portal.azure.com/#blade/Microsoft_Azure_ContainerRegistries/TagMetadataBlade/subscriptionId/sub-123/registry/myregistry.azurecr.io/repository/team/app/backend/tag/v3"
            )
        );
        assert_eq!(records[0].digest.as_deref(), Some("sha256:abcd"));
    }

    #[test]
    fn test_folder_is_optional() {
        let records = resolve(&pushed(), &config(Some("sub-123"), None)).unwrap();
        let url = records[0].console_url.as_deref().unwrap();
        assert!(url.contains("/repository/team/app/tag/v3"));
    }
}
