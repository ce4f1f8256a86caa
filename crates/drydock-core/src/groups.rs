use crate::error::DrydockError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an instance group within the fleet
///
/// `Other` is the explicit unrecognized variant: nodes from such groups are
/// never listed in the validation report, only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupRole {
    #[serde(rename = "control-plane")]
    ControlPlane,
    #[serde(rename = "apiserver")]
    ApiServer,
    #[serde(rename = "node")]
    Node,
    #[serde(rename = "bastion")]
    Bastion,
    #[serde(rename = "other")]
    Other,
}

impl GroupRole {
    /// The lower-case role string used in node classification and output
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::ControlPlane => "control-plane",
            GroupRole::ApiServer => "apiserver",
            GroupRole::Node => "node",
            GroupRole::Bastion => "bastion",
            GroupRole::Other => "other",
        }
    }

    /// Whether nodes of this role appear in the validation report
    pub fn is_validated(&self) -> bool {
        matches!(
            self,
            GroupRole::ControlPlane | GroupRole::ApiServer | GroupRole::Node
        )
    }
}

impl Default for GroupRole {
    fn default() -> Self {
        GroupRole::Node
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupRole {
    type Err = DrydockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "control-plane" => Ok(GroupRole::ControlPlane),
            "apiserver" => Ok(GroupRole::ApiServer),
            "node" | "" => Ok(GroupRole::Node),
            "bastion" => Ok(GroupRole::Bastion),
            "other" => Ok(GroupRole::Other),
            _ => Err(DrydockError::invalid_role(s)),
        }
    }
}

/// A named, sized class of machines the fleet operator expects to exist
///
/// Instance groups are immutable inputs to a validation run; failures carry a
/// clone of the group they concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroup {
    /// Group name, unique within the cluster
    pub name: String,
    /// Role all members of this group serve
    #[serde(default)]
    pub role: GroupRole,
    /// Desired member count
    #[serde(default)]
    pub min_size: u32,
    /// Upper bound for autoscaling groups, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
}

impl InstanceGroup {
    /// Create a new instance group
    pub fn new(name: impl Into<String>, role: GroupRole, min_size: u32) -> Self {
        Self {
            name: name.into(),
            role,
            min_size,
            max_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            GroupRole::ControlPlane,
            GroupRole::ApiServer,
            GroupRole::Node,
            GroupRole::Bastion,
            GroupRole::Other,
        ] {
            assert_eq!(role.as_str().parse::<GroupRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_empty_role_defaults_to_node() {
        assert_eq!("".parse::<GroupRole>().unwrap(), GroupRole::Node);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!("edge".parse::<GroupRole>().is_err());
    }

    #[test]
    fn test_validated_roles() {
        assert!(GroupRole::ControlPlane.is_validated());
        assert!(GroupRole::ApiServer.is_validated());
        assert!(GroupRole::Node.is_validated());
        assert!(!GroupRole::Bastion.is_validated());
        assert!(!GroupRole::Other.is_validated());
    }

    #[test]
    fn test_instance_group_yaml() {
        let yaml = "name: workers\nrole: node\nminSize: 3\n";
        let ig: InstanceGroup = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ig.name, "workers");
        assert_eq!(ig.role, GroupRole::Node);
        assert_eq!(ig.min_size, 3);
        assert_eq!(ig.max_size, None);
    }
}
