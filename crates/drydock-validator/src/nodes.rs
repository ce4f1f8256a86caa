use crate::filter::GroupFilter;
use drydock_core::{
    CloudInstanceGroup, FailureKind, GroupRole, InstanceGroup, InstancePoolState, InstanceStatus,
    Node, ValidationFailure, ValidationNode, ValidationReport,
};
use k8s_openapi::api::core::v1::NodeCondition;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Well-known node label carrying the topology zone
pub const LABEL_TOPOLOGY_ZONE: &str = "topology.kubernetes.io/zone";

/// Well-known node label carrying the hostname
pub const LABEL_HOSTNAME: &str = "kubernetes.io/hostname";

/// Outputs of fleet reconciliation consumed by the workload scan
pub struct NodeAssignments {
    /// Nodes whose Ready condition is True, in classification order
    pub ready_nodes: Vec<Node>,
    /// Node name to owning instance group
    pub group_by_node: BTreeMap<String, InstanceGroup>,
}

/// Reconcile observed cloud groups against the desired topology
///
/// Walks every in-scope observed group, checks live-member counts against
/// target size, classifies members that have not joined the cluster, and
/// hands joined members to node classification. Desired groups that never
/// appeared in the observation are recorded as missing.
pub fn reconcile_groups(
    report: &mut ValidationReport,
    cloud_groups: &BTreeMap<String, CloudInstanceGroup>,
    desired: &[InstanceGroup],
    filter: &dyn GroupFilter,
) -> NodeAssignments {
    let mut assignments = NodeAssignments {
        ready_nodes: Vec::new(),
        group_by_node: BTreeMap::new(),
    };
    let mut groups_seen: BTreeSet<&str> = BTreeSet::new();

    for cloud_group in cloud_groups.values() {
        let group = &cloud_group.instance_group;
        if !filter.includes(group) {
            continue;
        }
        groups_seen.insert(group.name.as_str());

        let live = cloud_group.live_members();
        if live < cloud_group.target_size {
            report.add_failure(ValidationFailure {
                kind: FailureKind::InstanceGroup,
                name: group.name.clone(),
                message: format!(
                    "InstanceGroup \"{}\" did not have enough nodes {} vs {}",
                    group.name, live, cloud_group.target_size
                ),
                instance_group: Some(group.clone()),
            });
        }

        for member in cloud_group.members() {
            match &member.node {
                None => {
                    // Bastions never join, warm-pool members are parked, and
                    // detached members are out of the fleet on purpose.
                    let expected_to_join = group.role != GroupRole::Bastion
                        && member.state != InstancePoolState::WarmPool
                        && member.status != InstanceStatus::Detached;

                    if expected_to_join {
                        report.add_failure(ValidationFailure {
                            kind: FailureKind::Machine,
                            name: member.id.clone(),
                            message: format!(
                                "machine \"{}\" has not yet joined cluster",
                                member.id
                            ),
                            instance_group: Some(group.clone()),
                        });
                    }
                }
                Some(node) => classify_node(report, node, group, &mut assignments),
            }
        }
    }

    for group in desired {
        if !filter.includes(group) {
            continue;
        }
        if !groups_seen.contains(group.name.as_str()) {
            report.add_failure(ValidationFailure {
                kind: FailureKind::InstanceGroup,
                name: group.name.clone(),
                message: format!(
                    "InstanceGroup \"{}\" is missing from the cloud provider",
                    group.name
                ),
                instance_group: Some(group.clone()),
            });
        }
    }

    assignments
}

/// Classify one joined node and record it in the report
///
/// Only control-plane, apiserver, and node roles are listed in the report;
/// other roles are logged and skipped. Ready nodes enter the ready set
/// regardless of role.
fn classify_node(
    report: &mut ValidationReport,
    node: &Node,
    group: &InstanceGroup,
    assignments: &mut NodeAssignments,
) {
    let node_name = node.metadata.name.clone().unwrap_or_default();
    assignments
        .group_by_node
        .insert(node_name.clone(), group.clone());

    let labels = node.metadata.labels.as_ref();
    let label = |key: &str| -> String {
        labels
            .and_then(|l| l.get(key))
            .cloned()
            .unwrap_or_default()
    };

    let classified = ValidationNode {
        name: node_name.clone(),
        zone: label(LABEL_TOPOLOGY_ZONE),
        hostname: label(LABEL_HOSTNAME),
        role: group.role.as_str().to_string(),
        status: node_ready_status(node),
    };

    let ready = is_node_ready(node);
    if ready {
        assignments.ready_nodes.push(node.clone());
    }

    if group.role.is_validated() {
        if !ready {
            report.add_failure(ValidationFailure {
                kind: FailureKind::Node,
                name: node_name.clone(),
                message: format!(
                    "node \"{}\" of role \"{}\" is not ready",
                    node_name, classified.role
                ),
                instance_group: Some(group.clone()),
            });
        }
        report.add_node(classified);
    } else {
        warn!(node = %node_name, role = %classified.role, "ignoring node with unrecognized role");
    }
}

/// The node's Ready condition, if present
fn node_ready_condition(node: &Node) -> Option<&NodeCondition> {
    node.status
        .as_ref()?
        .conditions
        .as_ref()?
        .iter()
        .find(|c| c.type_ == "Ready")
}

/// True iff the node carries a Ready condition with status True
pub fn is_node_ready(node: &Node) -> bool {
    matches!(node_ready_condition(node), Some(c) if c.status == "True")
}

/// Raw status string of the node's Ready condition; empty when absent
pub fn node_ready_status(node: &Node) -> String {
    node_ready_condition(node)
        .map(|c| c.status.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{GroupNames, ValidateAll};
    use drydock_core::CloudInstance;
    use k8s_openapi::api::core::v1::NodeStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap as LabelMap;

    fn make_node(name: &str, ready: bool) -> Node {
        let mut labels = LabelMap::new();
        labels.insert(LABEL_TOPOLOGY_ZONE.to_string(), "us-test-1a".to_string());
        labels.insert(LABEL_HOSTNAME.to_string(), name.to_string());
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            status: Some(NodeStatus {
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".to_string(),
                    status: if ready { "True" } else { "False" }.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn joined(id: &str, node: Node) -> CloudInstance {
        CloudInstance {
            id: id.to_string(),
            node: Some(node),
            ..Default::default()
        }
    }

    fn observe(groups: Vec<CloudInstanceGroup>) -> BTreeMap<String, CloudInstanceGroup> {
        groups
            .into_iter()
            .map(|g| (g.instance_group.name.clone(), g))
            .collect()
    }

    #[test]
    fn test_healthy_fleet_has_no_failures() {
        let ig = InstanceGroup::new("workers", GroupRole::Node, 2);
        let mut group = CloudInstanceGroup::new(ig.clone(), 2);
        group.ready.push(joined("i-1", make_node("node-1", true)));
        group.ready.push(joined("i-2", make_node("node-2", true)));

        let mut report = ValidationReport::new();
        let assignments =
            reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        assert!(report.is_healthy());
        assert_eq!(report.nodes.len(), 2);
        assert_eq!(assignments.ready_nodes.len(), 2);
        assert_eq!(
            assignments.group_by_node.get("node-1").map(|g| g.name.as_str()),
            Some("workers")
        );
    }

    #[test]
    fn test_undersized_group_with_detached_member() {
        // 2 ready members with nodes, 1 detached member: one instance-group
        // failure reporting 2 vs 3, no machine failure for the detached member
        let ig = InstanceGroup::new("workers", GroupRole::Node, 3);
        let mut group = CloudInstanceGroup::new(ig.clone(), 3);
        group.ready.push(joined("i-1", make_node("node-1", true)));
        group.ready.push(joined("i-2", make_node("node-2", true)));
        group.ready.push(CloudInstance {
            id: "i-3".to_string(),
            status: InstanceStatus::Detached,
            ..Default::default()
        });

        let mut report = ValidationReport::new();
        reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.kind, FailureKind::InstanceGroup);
        assert!(failure.message.contains("2 vs 3"));
    }

    #[test]
    fn test_unjoined_member_is_a_machine_failure() {
        let ig = InstanceGroup::new("workers", GroupRole::Node, 1);
        let mut group = CloudInstanceGroup::new(ig.clone(), 1);
        group.ready.push(CloudInstance::new("i-1"));

        let mut report = ValidationReport::new();
        reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Machine);
        assert!(report.failures[0]
            .message
            .contains("machine \"i-1\" has not yet joined cluster"));
    }

    #[test]
    fn test_bastion_never_expected_to_join() {
        let ig = InstanceGroup::new("bastions", GroupRole::Bastion, 1);
        let mut group = CloudInstanceGroup::new(ig.clone(), 1);
        group.ready.push(CloudInstance::new("i-b"));

        let mut report = ValidationReport::new();
        reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        assert!(report.is_healthy());
    }

    #[test]
    fn test_warm_pool_member_never_expected_to_join() {
        let ig = InstanceGroup::new("workers", GroupRole::Node, 1);
        let mut group = CloudInstanceGroup::new(ig.clone(), 1);
        group.ready.push(joined("i-1", make_node("node-1", true)));
        group.ready.push(CloudInstance {
            id: "i-warm".to_string(),
            state: InstancePoolState::WarmPool,
            ..Default::default()
        });

        let mut report = ValidationReport::new();
        reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        // the parked member has no node, and that is fine
        assert!(report.is_healthy());
    }

    #[test]
    fn test_detached_unjoined_member_is_not_a_machine_failure() {
        let ig = InstanceGroup::new("workers", GroupRole::Node, 1);
        let mut group = CloudInstanceGroup::new(ig.clone(), 1);
        group.ready.push(joined("i-1", make_node("node-1", true)));
        group.needs_update.push(CloudInstance {
            id: "i-old".to_string(),
            status: InstanceStatus::Detached,
            ..Default::default()
        });

        let mut report = ValidationReport::new();
        reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        assert!(report.is_healthy());
    }

    #[test]
    fn test_not_ready_node_fails() {
        let ig = InstanceGroup::new("control-plane-a", GroupRole::ControlPlane, 1);
        let mut group = CloudInstanceGroup::new(ig.clone(), 1);
        group.ready.push(joined("i-1", make_node("cp-1", false)));

        let mut report = ValidationReport::new();
        let assignments =
            reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Node);
        assert!(report.failures[0]
            .message
            .contains("node \"cp-1\" of role \"control-plane\" is not ready"));
        // still listed in the report, but not in the ready set
        assert_eq!(report.nodes.len(), 1);
        assert_eq!(report.nodes[0].status, "False");
        assert!(assignments.ready_nodes.is_empty());
    }

    #[test]
    fn test_unrecognized_role_is_skipped_not_failed() {
        let ig = InstanceGroup::new("edge", GroupRole::Other, 1);
        let mut group = CloudInstanceGroup::new(ig.clone(), 1);
        group.ready.push(joined("i-1", make_node("edge-1", false)));

        let mut report = ValidationReport::new();
        let assignments =
            reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        // not ready, but unrecognized: no failure, absent from the node list
        assert!(report.is_healthy());
        assert!(report.nodes.is_empty());
        // mapping still records the node's owning group
        assert!(assignments.group_by_node.contains_key("edge-1"));
    }

    #[test]
    fn test_ready_unrecognized_role_still_enters_ready_set() {
        let ig = InstanceGroup::new("edge", GroupRole::Other, 1);
        let mut group = CloudInstanceGroup::new(ig.clone(), 1);
        group.ready.push(joined("i-1", make_node("edge-1", true)));

        let mut report = ValidationReport::new();
        let assignments =
            reconcile_groups(&mut report, &observe(vec![group]), &[ig], &ValidateAll);

        assert_eq!(assignments.ready_nodes.len(), 1);
        assert!(report.nodes.is_empty());
    }

    #[test]
    fn test_desired_group_missing_from_cloud() {
        let present = InstanceGroup::new("workers", GroupRole::Node, 1);
        let absent = InstanceGroup::new("gpu-workers", GroupRole::Node, 1);
        let mut group = CloudInstanceGroup::new(present.clone(), 1);
        group.ready.push(joined("i-1", make_node("node-1", true)));

        let mut report = ValidationReport::new();
        reconcile_groups(
            &mut report,
            &observe(vec![group]),
            &[present, absent],
            &ValidateAll,
        );

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::InstanceGroup);
        assert!(report.failures[0]
            .message
            .contains("InstanceGroup \"gpu-workers\" is missing from the cloud provider"));
    }

    #[test]
    fn test_filtered_out_group_produces_no_failures() {
        // An undersized, unjoined, missing mess, but out of scope
        let broken = InstanceGroup::new("broken", GroupRole::Node, 5);
        let missing = InstanceGroup::new("missing", GroupRole::Node, 1);
        let mut group = CloudInstanceGroup::new(broken.clone(), 5);
        group.ready.push(CloudInstance::new("i-1"));

        let mut report = ValidationReport::new();
        reconcile_groups(
            &mut report,
            &observe(vec![group]),
            &[broken, missing],
            &GroupNames::new(["healthy"]),
        );

        assert!(report.is_healthy());
    }

    #[test]
    fn test_node_readiness_helpers() {
        assert!(is_node_ready(&make_node("n", true)));
        assert!(!is_node_ready(&make_node("n", false)));
        assert_eq!(node_ready_status(&make_node("n", true)), "True");
        assert_eq!(node_ready_status(&Node::default()), "");
    }
}
