//! Drydock Core - Data model for fleet topology validation
//!
//! This crate provides:
//! - The desired-topology model (clusters, instance groups, roles)
//! - The observed-topology model (cloud instance groups and members)
//! - The validation report types emitted by a run
//! - Error types with miette diagnostics

pub mod cloud;
pub mod cluster;
pub mod error;
pub mod groups;
pub mod report;

// Re-export commonly used types
pub use cloud::{CloudInstance, CloudInstanceGroup, InstancePoolState, InstanceStatus};
pub use cluster::{ClusterSpec, DnsMode, ExternalDnsProvider};
pub use error::{DrydockError, Result};
pub use groups::{GroupRole, InstanceGroup};
pub use report::{FailureKind, ValidationFailure, ValidationNode, ValidationReport};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Node, Pod};

/// Serialize a document to JSON
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        DrydockError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Serialize a document to pretty JSON
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        DrydockError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a document from YAML
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        DrydockError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_round_trip() {
        let mut report = ValidationReport::new();
        report.add_node(ValidationNode {
            name: "node-1".to_string(),
            zone: "us-test-1a".to_string(),
            role: "node".to_string(),
            hostname: "node-1".to_string(),
            status: "True".to_string(),
        });

        let json = to_json(&report).unwrap();
        assert!(json.contains("node-1"));

        let parsed: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.nodes.len(), 1);
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_instance_groups_from_yaml() {
        let yaml = "- name: control-plane-a\n  role: control-plane\n  minSize: 1\n- name: workers\n  role: node\n  minSize: 3\n";
        let groups: Vec<InstanceGroup> = from_yaml(yaml).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].role, GroupRole::ControlPlane);
        assert_eq!(groups[1].min_size, 3);
    }
}
