use crate::error::Result;
use async_trait::async_trait;
use drydock_core::{CloudInstanceGroup, ClusterSpec, InstanceGroup, Node, Pod};
use futures_util::stream::BoxStream;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Query interface to the cloud provider's instance inventory
///
/// The implementation owns authentication, paging, and the correlation of
/// cloud instances to orchestrator nodes. The validator only consumes the
/// finished observation. Keys are group names; the sorted map keeps report
/// ordering stable across runs on identical snapshots.
#[async_trait]
pub trait CloudInventory: Send + Sync {
    /// Observe the given instance groups
    ///
    /// Groups with no cloud-side counterpart are absent from the result.
    /// With `include_unmatched` false, cloud groups matching no desired group
    /// are dropped rather than returned.
    async fn cloud_groups(
        &self,
        cluster: &ClusterSpec,
        groups: &[InstanceGroup],
        include_unmatched: bool,
        nodes: &[Node],
    ) -> Result<BTreeMap<String, CloudInstanceGroup>>;
}

/// Query interface to the orchestrator control plane
///
/// Both calls are read-only. The pod inventory arrives as a single ordered
/// stream; the implementation handles pagination internally, and the stream
/// is restartable only by calling `stream_pods` again.
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// List every node in the cluster
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Stream every pod in the cluster, across all namespaces
    ///
    /// An `Err` item is fatal to the run; the consumer must not treat what
    /// it saw before the error as a complete inventory.
    fn stream_pods(&self) -> BoxStream<'_, Result<Pod>>;
}

/// Hostname resolution
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve a hostname to its current set of addresses
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>>;
}
