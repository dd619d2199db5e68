// Dependency Outcome Builder
// Maps raw per-container health signals into uniform dependency statuses

use serde::{Deserialize, Serialize};

use crate::boundary::ServiceHealth;
use crate::models::{DependencyState, DependencyStatus};

/// Error message used when a declared service never showed up in the
/// health report
const UNKNOWN_SERVICE_MESSAGE: &str = "Unknown";

/// One service container declared by the stage definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub identifier: String,
    pub name: String,
    pub image: String,
    pub log_key: Option<String>,
}

/// Build the uniform dependency-status list for a stage. Every declared
/// service produces exactly one status: services missing from the health
/// report are marked ERROR with message "Unknown" rather than dropped.
pub fn build_dependency_outcomes(
    declared: &[ServiceDefinition],
    reported: &[ServiceHealth],
) -> Vec<DependencyStatus> {
    declared
        .iter()
        .map(|service| {
            match reported.iter().find(|h| h.identifier == service.identifier) {
                Some(health) => DependencyStatus {
                    identifier: service.identifier.clone(),
                    name: service.name.clone(),
                    image: service.image.clone(),
                    started_at_millis: health.started_at_millis,
                    ended_at_millis: health.ended_at_millis,
                    status: if health.healthy {
                        DependencyState::Success
                    } else {
                        DependencyState::Error
                    },
                    error_message: if health.healthy {
                        None
                    } else {
                        Some(
                            health
                                .error_message
                                .clone()
                                .unwrap_or_else(|| UNKNOWN_SERVICE_MESSAGE.to_string()),
                        )
                    },
                    log_key: service.log_key.clone(),
                },
                None => DependencyStatus {
                    identifier: service.identifier.clone(),
                    name: service.name.clone(),
                    image: service.image.clone(),
                    started_at_millis: None,
                    ended_at_millis: None,
                    status: DependencyState::Error,
                    error_message: Some(UNKNOWN_SERVICE_MESSAGE.to_string()),
                    log_key: service.log_key.clone(),
                },
            }
        })
        .collect()
}
