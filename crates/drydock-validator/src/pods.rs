use crate::error::{Result, ValidatorError};
use crate::filter::PodFilter;
use drydock_core::{
    FailureKind, InstanceGroup, Node, Pod, ValidationFailure, ValidationReport,
};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::collections::{BTreeMap, BTreeSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Node label marking control-plane membership
pub const LABEL_CONTROL_PLANE: &str = "node-role.kubernetes.io/control-plane";

/// Pod label identifying system workloads
pub const LABEL_APP: &str = "k8s-app";

/// Namespace hosting the control-plane's own workloads
pub const SYSTEM_NAMESPACE: &str = "kube-system";

/// Priority class of workloads pinned to a specific node
pub const PRIORITY_NODE_CRITICAL: &str = "system-node-critical";

/// Priority class of cluster-wide critical workloads
pub const PRIORITY_CLUSTER_CRITICAL: &str = "system-cluster-critical";

/// Static workloads every control-plane node must run
const CONTROL_PLANE_STATIC_PODS: [&str; 3] =
    ["kube-apiserver", "kube-controller-manager", "kube-scheduler"];

/// Per-run bookkeeping for the single streaming pass over the pod inventory
struct WorkloadScan<'a> {
    /// Control-plane node name to static workloads not yet observed there
    pending_static: BTreeMap<String, BTreeSet<&'static str>>,
    /// Node address to node name, for ready nodes only
    node_by_address: BTreeMap<String, String>,
    group_by_node: &'a BTreeMap<String, InstanceGroup>,
    filter: &'a dyn PodFilter,
}

impl<'a> WorkloadScan<'a> {
    fn new(
        ready_nodes: &[Node],
        group_by_node: &'a BTreeMap<String, InstanceGroup>,
        filter: &'a dyn PodFilter,
    ) -> Self {
        let mut pending_static = BTreeMap::new();
        let mut node_by_address = BTreeMap::new();

        for node in ready_nodes {
            let name = node.metadata.name.clone().unwrap_or_default();

            let is_control_plane = node
                .metadata
                .labels
                .as_ref()
                .is_some_and(|l| l.contains_key(LABEL_CONTROL_PLANE));
            if is_control_plane {
                pending_static.insert(
                    name.clone(),
                    CONTROL_PLANE_STATIC_PODS.iter().copied().collect(),
                );
            }

            if let Some(addresses) = node.status.as_ref().and_then(|s| s.addresses.as_ref()) {
                for address in addresses {
                    node_by_address.insert(address.address.clone(), name.clone());
                }
            }
        }

        Self {
            pending_static,
            node_by_address,
            group_by_node,
            filter,
        }
    }

    /// The name of the ready node this pod runs on, by host address
    fn host_node(&self, pod: &Pod) -> Option<&String> {
        pod.status
            .as_ref()
            .and_then(|s| s.host_ip.as_ref())
            .and_then(|ip| self.node_by_address.get(ip))
    }

    /// Inspect one pod from the stream
    fn inspect(&mut self, report: &mut ValidationReport, pod: &Pod) {
        let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
        let pod_name = pod.metadata.name.as_deref().unwrap_or_default();

        // Static-workload accounting runs before the caller's filter: a
        // filtered-out kube-apiserver pod still proves the node runs one.
        if namespace == SYSTEM_NAMESPACE {
            let app = pod
                .metadata
                .labels
                .as_ref()
                .and_then(|l| l.get(LABEL_APP))
                .cloned();
            if let (Some(app), Some(node)) = (app, self.host_node(pod).cloned()) {
                if let Some(pending) = self.pending_static.get_mut(&node) {
                    pending.remove(app.as_str());
                }
            }
        }

        if !self.filter.includes(pod) {
            debug!(namespace, pod = pod_name, "pod excluded from validation");
            return;
        }

        let priority = pod
            .spec
            .as_ref()
            .and_then(|s| s.priority_class_name.as_deref())
            .unwrap_or_default();
        if priority != PRIORITY_CLUSTER_CRITICAL && priority != PRIORITY_NODE_CRITICAL {
            return;
        }

        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .unwrap_or_default();
        if phase == "Succeeded" {
            return;
        }

        // Node-critical workloads are pinned to one group; cluster-critical
        // ones are not attributed to any
        let pod_group = if priority == PRIORITY_NODE_CRITICAL {
            self.host_node(pod)
                .and_then(|node| self.group_by_node.get(node))
                .cloned()
        } else {
            None
        };

        let subject = format!("{}/{}", namespace, pod_name);

        if phase == "Pending" {
            report.add_failure(ValidationFailure {
                kind: FailureKind::Pod,
                name: subject,
                message: format!("{} pod \"{}\" is pending", priority, pod_name),
                instance_group: pod_group,
            });
            return;
        }
        if phase == "Unknown" {
            report.add_failure(ValidationFailure {
                kind: FailureKind::Pod,
                name: subject,
                message: format!("{} pod \"{}\" is unknown phase", priority, pod_name),
                instance_group: pod_group,
            });
            return;
        }

        let not_ready: Vec<&str> = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .filter(|c| !c.ready)
                    .map(|c| c.name.as_str())
                    .collect()
            })
            .unwrap_or_default();

        if !not_ready.is_empty() {
            report.add_failure(ValidationFailure {
                kind: FailureKind::Pod,
                name: subject,
                message: format!(
                    "{} pod \"{}\" is not ready ({})",
                    priority,
                    pod_name,
                    not_ready.join(",")
                ),
                instance_group: pod_group,
            });
        }
    }

    /// Record a node failure for every mandatory workload still unobserved
    fn finish(self, report: &mut ValidationReport) {
        for (node, missing) in &self.pending_static {
            for app in missing {
                report.add_failure(ValidationFailure {
                    kind: FailureKind::Node,
                    name: node.clone(),
                    message: format!("control-plane node \"{}\" is missing {} pod", node, app),
                    instance_group: self.group_by_node.get(node).cloned(),
                });
            }
        }
    }
}

/// Stream the cluster's pod inventory once and classify workload problems
///
/// Must run to stream completion before the report is final; a failed or
/// canceled stream aborts the run without a report.
pub async fn scan_workloads(
    report: &mut ValidationReport,
    mut pods: BoxStream<'_, Result<Pod>>,
    ready_nodes: &[Node],
    group_by_node: &BTreeMap<String, InstanceGroup>,
    filter: &dyn PodFilter,
    token: &CancellationToken,
) -> Result<()> {
    let mut scan = WorkloadScan::new(ready_nodes, group_by_node, filter);

    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ValidatorError::Canceled),
            item = pods.next() => item,
        };
        let Some(item) = item else { break };
        scan.inspect(report, &item?);
    }

    scan.finish(report);
    Ok(())
}
