// Stage Infrastructure Models
// Describes the provisioned execution environment shared by a stage

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::DispatchError;

/// Operating system requested for hosted-fleet routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Linux,
    Windows,
    Macos,
}

impl OsType {
    pub fn token(&self) -> &'static str {
        match self {
            OsType::Linux => "linux",
            OsType::Windows => "windows",
            OsType::Macos => "macos",
        }
    }
}

/// CPU architecture requested for hosted-fleet routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchType {
    Amd64,
    Arm64,
}

impl ArchType {
    pub fn token(&self) -> &'static str {
        match self {
            ArchType::Amd64 => "amd64",
            ArchType::Arm64 => "arm64",
        }
    }
}

/// Execution environment for one stage. Produced once by the stage
/// initializer and shared read-only by every step in the stage; exactly one
/// variant is populated and no step may mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StageInfraDetails {
    /// Container pod reachable inside the cluster
    ContainerPod { ip_address: String, namespace: String },

    /// Self-managed VM leased from a pool
    Vm {
        pool_id: String,
        ip_address: String,
        working_dir: String,
        volume_mounts: HashMap<String, String>,
        infra_info: String,
    },

    /// VM leased from the managed hosted fleet
    HostedVm {
        pool_id: String,
        ip_address: String,
        working_dir: String,
        volume_mounts: HashMap<String, String>,
        infra_info: String,
        os: OsType,
        arch: ArchType,
    },
}

impl StageInfraDetails {
    /// Build a container-pod descriptor
    pub fn container_pod(ip_address: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::ContainerPod {
            ip_address: ip_address.into(),
            namespace: namespace.into(),
        }
    }

    /// Build a VM descriptor. VM variants always carry a non-empty pool id.
    pub fn vm(
        pool_id: impl Into<String>,
        ip_address: impl Into<String>,
        working_dir: impl Into<String>,
        volume_mounts: HashMap<String, String>,
        infra_info: impl Into<String>,
    ) -> Result<Self, DispatchError> {
        let pool_id = pool_id.into();
        if pool_id.trim().is_empty() {
            return Err(DispatchError::Validation(
                "pool id cannot be empty for vm infrastructure".to_string(),
            ));
        }
        Ok(Self::Vm {
            pool_id,
            ip_address: ip_address.into(),
            working_dir: working_dir.into(),
            volume_mounts,
            infra_info: infra_info.into(),
        })
    }

    /// Build a hosted-VM descriptor. VM variants always carry a non-empty
    /// pool id.
    #[allow(clippy::too_many_arguments)]
    pub fn hosted_vm(
        pool_id: impl Into<String>,
        ip_address: impl Into<String>,
        working_dir: impl Into<String>,
        volume_mounts: HashMap<String, String>,
        infra_info: impl Into<String>,
        os: OsType,
        arch: ArchType,
    ) -> Result<Self, DispatchError> {
        let pool_id = pool_id.into();
        if pool_id.trim().is_empty() {
            return Err(DispatchError::Validation(
                "pool id cannot be empty for hosted vm infrastructure".to_string(),
            ));
        }
        Ok(Self::HostedVm {
            pool_id,
            ip_address: ip_address.into(),
            working_dir: working_dir.into(),
            volume_mounts,
            infra_info: infra_info.into(),
            os,
            arch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_requires_pool_id() {
        let err = StageInfraDetails::vm("", "10.0.0.1", "/work", HashMap::new(), "vm");
        assert!(matches!(err, Err(DispatchError::Validation(_))));

        let ok = StageInfraDetails::vm("pool-a", "10.0.0.1", "/work", HashMap::new(), "vm");
        assert!(ok.is_ok());
    }

    #[test]
    fn test_hosted_vm_requires_pool_id() {
        let err = StageInfraDetails::hosted_vm(
            "  ",
            "10.0.0.2",
            "/work",
            HashMap::new(),
            "hosted",
            OsType::Linux,
            ArchType::Amd64,
        );
        assert!(matches!(err, Err(DispatchError::Validation(_))));
    }

    #[test]
    fn test_platform_tokens() {
        assert_eq!(OsType::Linux.token(), "linux");
        assert_eq!(ArchType::Arm64.token(), "arm64");
    }
}
