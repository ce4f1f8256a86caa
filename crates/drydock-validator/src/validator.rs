use crate::dns;
use crate::error::{Result, ValidatorError};
use crate::filter::{GroupFilter, PodFilter, ValidateAll};
use crate::traits::{CloudInventory, HostResolver, OrchestratorClient};
use crate::{nodes, pods};
use drydock_core::{ClusterSpec, InstanceGroup, ValidationReport};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Validates one cluster's observed state against its desired topology
///
/// The validator is read-only and owns no state across runs: each call to
/// [`validate`](ClusterValidator::validate) builds its own report and lookup
/// tables and discards them. Concurrent runs must each construct their own
/// report; the collaborators are shared read-only.
pub struct ClusterValidator {
    cluster: ClusterSpec,
    instance_groups: Vec<InstanceGroup>,
    cloud: Arc<dyn CloudInventory>,
    orchestrator: Arc<dyn OrchestratorClient>,
    resolver: Arc<dyn HostResolver>,
    group_filter: Box<dyn GroupFilter>,
    pod_filter: Box<dyn PodFilter>,
}

impl ClusterValidator {
    /// Create a validator for one cluster
    ///
    /// Fails when no instance groups are configured. Filters default to
    /// validating everything.
    pub fn new(
        cluster: ClusterSpec,
        instance_groups: Vec<InstanceGroup>,
        cloud: Arc<dyn CloudInventory>,
        orchestrator: Arc<dyn OrchestratorClient>,
        resolver: Arc<dyn HostResolver>,
        group_filter: Option<Box<dyn GroupFilter>>,
        pod_filter: Option<Box<dyn PodFilter>>,
    ) -> Result<Self> {
        if instance_groups.is_empty() {
            return Err(ValidatorError::NoInstanceGroups);
        }

        Ok(Self {
            cluster,
            instance_groups,
            cloud,
            orchestrator,
            resolver,
            group_filter: group_filter.unwrap_or_else(|| Box::new(ValidateAll)),
            pod_filter: pod_filter.unwrap_or_else(|| Box::new(ValidateAll)),
        })
    }

    /// Run one validation pass
    ///
    /// Returns the report, or an error when validation could not be
    /// performed at all. An error never carries a partial report.
    pub async fn validate(&self, token: CancellationToken) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();

        // A cluster still publishing the bootstrap placeholder address has no
        // control plane to talk to; report that one finding and stop.
        if self.cluster.uses_dns_discovery() {
            let placeholder = cancellable(
                &token,
                dns::find_placeholder_address(self.resolver.as_ref(), &self.cluster.api_host),
            )
            .await?;

            if let Some(address) = placeholder {
                let provider = self.cluster.external_dns_provider();
                warn!(%address, %provider, "API DNS record still resolves to the placeholder");
                report.add_failure(dns::placeholder_failure(provider, address));
                return Ok(report);
            }
        }

        let node_list = cancellable(&token, self.orchestrator.list_nodes()).await?;
        debug!(nodes = node_list.len(), "listed orchestrator nodes");

        let cloud_groups = cancellable(
            &token,
            self.cloud
                .cloud_groups(&self.cluster, &self.instance_groups, false, &node_list),
        )
        .await?;
        debug!(groups = cloud_groups.len(), "observed cloud instance groups");

        let assignments = nodes::reconcile_groups(
            &mut report,
            &cloud_groups,
            &self.instance_groups,
            self.group_filter.as_ref(),
        );

        pods::scan_workloads(
            &mut report,
            self.orchestrator.stream_pods(),
            &assignments.ready_nodes,
            &assignments.group_by_node,
            self.pod_filter.as_ref(),
            &token,
        )
        .await?;

        info!(
            cluster = %self.cluster.name,
            failures = report.failures.len(),
            nodes = report.nodes.len(),
            "validation pass complete"
        );
        Ok(report)
    }
}

/// Race a collaborator call against cancellation
///
/// Cancellation wins ties, so a canceled run aborts deterministically with
/// no report.
async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ValidatorError::Canceled),
        result = fut => result,
    }
}
