use crate::error::{Result, ValidatorError};
use crate::traits::{CloudInventory, HostResolver, OrchestratorClient};
use async_trait::async_trait;
use drydock_core::{
    CloudInstance, CloudInstanceGroup, ClusterSpec, InstanceGroup, InstancePoolState,
    InstanceStatus, Node, Pod,
};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use tracing::debug;

/// One member of an instance group as captured in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMember {
    /// Cloud instance identity
    pub id: String,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default)]
    pub state: InstancePoolState,
    /// Name of the orchestrator node this instance registered as, if joined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

/// One instance group as captured in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotGroup {
    pub name: String,
    /// Member count the group should reach; the desired group's minimum when
    /// absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_size: Option<usize>,
    #[serde(default)]
    pub ready: Vec<SnapshotMember>,
    #[serde(default)]
    pub needs_update: Vec<SnapshotMember>,
}

/// A point-in-time capture of the observed cluster state
///
/// `nodes` and `pods` hold plain Kubernetes objects, so a snapshot file can
/// be assembled directly from `kubectl get -o yaml` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSnapshot {
    pub cloud_groups: Vec<SnapshotGroup>,
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
}

/// Cloud inventory backed by a snapshot
pub struct SnapshotInventory {
    groups: Vec<SnapshotGroup>,
}

impl SnapshotInventory {
    pub fn new(groups: Vec<SnapshotGroup>) -> Self {
        Self { groups }
    }
}

#[async_trait]
impl CloudInventory for SnapshotInventory {
    async fn cloud_groups(
        &self,
        _cluster: &ClusterSpec,
        groups: &[InstanceGroup],
        include_unmatched: bool,
        nodes: &[Node],
    ) -> Result<BTreeMap<String, CloudInstanceGroup>> {
        let desired_by_name: HashMap<&str, &InstanceGroup> =
            groups.iter().map(|g| (g.name.as_str(), g)).collect();
        let node_by_name: HashMap<&str, &Node> = nodes
            .iter()
            .filter_map(|n| n.metadata.name.as_deref().map(|name| (name, n)))
            .collect();

        let correlate = |members: &[SnapshotMember]| -> Vec<CloudInstance> {
            members
                .iter()
                .map(|m| CloudInstance {
                    id: m.id.clone(),
                    status: m.status,
                    state: m.state,
                    node: m
                        .node_name
                        .as_deref()
                        .and_then(|name| node_by_name.get(name))
                        .map(|n| (*n).clone()),
                })
                .collect()
        };

        let mut observed = BTreeMap::new();
        for group in &self.groups {
            let Some(desired) = desired_by_name.get(group.name.as_str()) else {
                debug!(
                    group = %group.name,
                    include_unmatched,
                    "snapshot group matches no desired instance group"
                );
                continue;
            };

            observed.insert(
                group.name.clone(),
                CloudInstanceGroup {
                    instance_group: (*desired).clone(),
                    target_size: group.target_size.unwrap_or(desired.min_size as usize),
                    ready: correlate(&group.ready),
                    needs_update: correlate(&group.needs_update),
                },
            );
        }

        Ok(observed)
    }
}

/// Orchestrator queries served from a snapshot
pub struct SnapshotOrchestrator {
    nodes: Vec<Node>,
    pods: Vec<Pod>,
}

impl SnapshotOrchestrator {
    pub fn new(nodes: Vec<Node>, pods: Vec<Pod>) -> Self {
        Self { nodes, pods }
    }
}

#[async_trait]
impl OrchestratorClient for SnapshotOrchestrator {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.nodes.clone())
    }

    fn stream_pods(&self) -> BoxStream<'_, Result<Pod>> {
        stream::iter(self.pods.clone().into_iter().map(Ok)).boxed()
    }
}

/// Resolver answering from a fixed host table
#[derive(Default)]
pub struct StaticResolver {
    table: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host entry
    pub fn with_entry(mut self, host: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        self.table.insert(host.into(), addresses);
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.table
            .get(host)
            .cloned()
            .ok_or_else(|| ValidatorError::dns_resolution(host, "host not found"))
    }
}

/// Resolver using the operating system's lookup machinery
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        // lookup_host wants host:port; the port is discarded
        let addrs = tokio::net::lookup_host((host, 443))
            .await
            .map_err(|e| ValidatorError::dns_resolution(host, e.to_string()))?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}
