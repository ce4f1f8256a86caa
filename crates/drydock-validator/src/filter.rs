use drydock_core::{InstanceGroup, Pod};

/// Scope predicate over instance groups
///
/// Injected into the validator so callers can narrow a run to a subset of
/// the fleet (e.g. during a rolling update of one group).
pub trait GroupFilter: Send + Sync {
    /// Whether the group is in scope for this run
    fn includes(&self, group: &InstanceGroup) -> bool;

    /// Name of the filter
    fn name(&self) -> &str;
}

/// Inclusion predicate over workloads
///
/// Rejected workloads are not classified, but the mandatory static-workload
/// bookkeeping still observes them.
pub trait PodFilter: Send + Sync {
    /// Whether the workload should be classified
    fn includes(&self, pod: &Pod) -> bool;

    /// Name of the filter
    fn name(&self) -> &str;
}

/// The default scope: everything is validated
pub struct ValidateAll;

impl GroupFilter for ValidateAll {
    fn includes(&self, _group: &InstanceGroup) -> bool {
        true
    }

    fn name(&self) -> &str {
        "ValidateAll"
    }
}

impl PodFilter for ValidateAll {
    fn includes(&self, _pod: &Pod) -> bool {
        true
    }

    fn name(&self) -> &str {
        "ValidateAll"
    }
}

/// Scope a run to an explicit set of group names
pub struct GroupNames {
    names: Vec<String>,
}

impl GroupNames {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl GroupFilter for GroupNames {
    fn includes(&self, group: &InstanceGroup) -> bool {
        self.names.iter().any(|n| n == &group.name)
    }

    fn name(&self) -> &str {
        "GroupNames"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::GroupRole;

    #[test]
    fn test_validate_all_includes_everything() {
        let group = InstanceGroup::new("workers", GroupRole::Node, 3);
        assert!(GroupFilter::includes(&ValidateAll, &group));
        assert!(PodFilter::includes(&ValidateAll, &Pod::default()));
    }

    #[test]
    fn test_group_names_scope() {
        let filter = GroupNames::new(["workers"]);
        assert!(filter.includes(&InstanceGroup::new("workers", GroupRole::Node, 3)));
        assert!(!filter.includes(&InstanceGroup::new("bastions", GroupRole::Bastion, 1)));
    }
}
