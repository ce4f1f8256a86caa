use crate::groups::InstanceGroup;
use k8s_openapi::api::core::v1::Node;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a cloud instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceStatus {
    /// Member of the active fleet
    InService,
    /// Intentionally excluded from the active fleet
    Detached,
}

impl Default for InstanceStatus {
    fn default() -> Self {
        InstanceStatus::InService
    }
}

/// Pool membership of a cloud instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstancePoolState {
    /// Regular pool member, expected to run and join the cluster
    Active,
    /// Held in reserve; not expected to be running or joined
    WarmPool,
}

impl Default for InstancePoolState {
    fn default() -> Self {
        InstancePoolState::Active
    }
}

/// The cloud provider's live view of one machine
#[derive(Debug, Clone, Default)]
pub struct CloudInstance {
    /// Cloud instance identity
    pub id: String,
    /// Lifecycle status
    pub status: InstanceStatus,
    /// Pool membership
    pub state: InstancePoolState,
    /// The orchestrator node this instance registered as, if it has joined
    pub node: Option<Node>,
}

impl CloudInstance {
    /// Create an in-service, active-pool instance with no node link
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// The cloud provider's live view of one instance group
///
/// Members come back in two partitions, current and pending-update; both are
/// validated identically.
#[derive(Debug, Clone)]
pub struct CloudInstanceGroup {
    /// The desired group this observation was matched to
    pub instance_group: InstanceGroup,
    /// Member count the group should reach
    pub target_size: usize,
    /// Members running the current launch configuration
    pub ready: Vec<CloudInstance>,
    /// Members awaiting a rolling update
    pub needs_update: Vec<CloudInstance>,
}

impl CloudInstanceGroup {
    /// Create an observation with no members
    pub fn new(instance_group: InstanceGroup, target_size: usize) -> Self {
        Self {
            instance_group,
            target_size,
            ready: Vec::new(),
            needs_update: Vec::new(),
        }
    }

    /// Iterate all members, current partition first
    pub fn members(&self) -> impl Iterator<Item = &CloudInstance> {
        self.ready.iter().chain(self.needs_update.iter())
    }

    /// Count members that are part of the active fleet
    pub fn live_members(&self) -> usize {
        self.members()
            .filter(|m| m.status != InstanceStatus::Detached)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::GroupRole;

    #[test]
    fn test_members_order() {
        let ig = InstanceGroup::new("workers", GroupRole::Node, 2);
        let mut group = CloudInstanceGroup::new(ig, 2);
        group.ready.push(CloudInstance::new("i-1"));
        group.needs_update.push(CloudInstance::new("i-2"));

        let ids: Vec<&str> = group.members().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["i-1", "i-2"]);
    }

    #[test]
    fn test_detached_excluded_from_live_count() {
        let ig = InstanceGroup::new("workers", GroupRole::Node, 3);
        let mut group = CloudInstanceGroup::new(ig, 3);
        group.ready.push(CloudInstance::new("i-1"));
        group.ready.push(CloudInstance {
            id: "i-2".to_string(),
            status: InstanceStatus::Detached,
            ..Default::default()
        });
        group.needs_update.push(CloudInstance::new("i-3"));

        assert_eq!(group.live_members(), 2);
    }

    #[test]
    fn test_instance_defaults() {
        let instance = CloudInstance::new("i-1");
        assert_eq!(instance.status, InstanceStatus::InService);
        assert_eq!(instance.state, InstancePoolState::Active);
        assert!(instance.node.is_none());
    }
}
