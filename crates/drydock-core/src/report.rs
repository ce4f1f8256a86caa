use crate::groups::InstanceGroup;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Dns,
    InstanceGroup,
    Machine,
    Node,
    Pod,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Dns => "dns",
            FailureKind::InstanceGroup => "instance-group",
            FailureKind::Machine => "machine",
            FailureKind::Node => "node",
            FailureKind::Pod => "pod",
        };
        write!(f, "{}", s)
    }
}

/// One validation failure; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Failure category
    #[serde(rename = "type")]
    pub kind: FailureKind,
    /// Name of the failing subject
    pub name: String,
    /// Human-readable description
    pub message: String,
    /// The instance group this failure concerns, if any
    #[serde(
        rename = "instanceGroup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub instance_group: Option<InstanceGroup>,
}

/// Classification of one orchestrator node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationNode {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    /// Raw status of the node's Ready condition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
}

/// Result of a single validation run
///
/// An append-only sink: components record failures and classified nodes in
/// the order they encounter them, and the finished report is handed back as
/// the immutable result. An empty failure list means the cluster validated
/// clean; "could not validate" is an error return instead, never a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ValidationFailure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ValidationNode>,
}

impl ValidationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn add_failure(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    /// Record a classified node
    pub fn add_node(&mut self, node: ValidationNode) {
        self.nodes.push(node);
    }

    /// True iff no failures were recorded
    pub fn is_healthy(&self) -> bool {
        self.failures.is_empty()
    }
}
