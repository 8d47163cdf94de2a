//! Detection order and group descriptors
//!
//! ```toml
//! [[groups]]
//!   [[groups.buildpacks]]
//!   id = "org.cloudfoundry.node-engine"
//! ```

use crate::error::ShimResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reference to a lifecycle buildpack inside a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackRef {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl BuildpackRef {
    /// Reference by id only, letting the lifecycle pick the version
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }
}

/// Ordered buildpacks selected for a build; earlier entries run first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub buildpacks: Vec<BuildpackRef>,
}

impl Group {
    pub fn from_file(path: &Path) -> ShimResult<Self> {
        super::read_toml(path)
    }

    pub fn write(&self, path: &Path) -> ShimResult<()> {
        super::write_toml(path, self)
    }

    /// Put a buildpack in front of everything already in the group
    pub fn prepend(&mut self, buildpack: BuildpackRef) {
        self.buildpacks.insert(0, buildpack);
    }

    pub fn ids(&self) -> Vec<&str> {
        self.buildpacks.iter().map(|b| b.id.as_str()).collect()
    }
}

/// Candidate groups offered to the detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Order {
    pub fn from_file(path: &Path) -> ShimResult<Self> {
        super::read_toml(path)
    }

    pub fn write(&self, path: &Path) -> ShimResult<()> {
        super::write_toml(path, self)
    }

    /// Concatenate the groups of several orders, keeping their sequence
    pub fn combine(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            groups: orders.into_iter().flat_map(|o| o.groups).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: &str = r#"
[[groups]]
  [[groups.buildpacks]]
  id = "org.cloudfoundry.node-engine"

  [[groups.buildpacks]]
  id = "org.cloudfoundry.npm"
  version = "0.0.5"

[[groups]]
  [[groups.buildpacks]]
  id = "org.cloudfoundry.yarn"
"#;

    #[test]
    fn parse_order() {
        let order: Order = toml::from_str(ORDER).unwrap();
        assert_eq!(order.groups.len(), 2);
        assert_eq!(
            order.groups[0].ids(),
            vec!["org.cloudfoundry.node-engine", "org.cloudfoundry.npm"]
        );
        assert_eq!(order.groups[0].buildpacks[1].version.as_deref(), Some("0.0.5"));
        assert_eq!(order.groups[1].buildpacks[0].version, None);
    }

    #[test]
    fn version_omitted_when_absent() {
        let group = Group {
            buildpacks: vec![BuildpackRef::new("buildpack.0")],
        };
        let encoded = toml::to_string(&group).unwrap();
        assert!(encoded.contains("id = \"buildpack.0\""));
        assert!(!encoded.contains("version"));
    }

    #[test]
    fn prepend_goes_first() {
        let mut group = Group {
            buildpacks: vec![BuildpackRef::new("lang-b")],
        };
        group.prepend(BuildpackRef::new("buildpack.1"));
        group.prepend(BuildpackRef::new("buildpack.0"));
        assert_eq!(group.ids(), vec!["buildpack.0", "buildpack.1", "lang-b"]);
    }

    #[test]
    fn combine_keeps_fragment_sequence() {
        let first: Order = toml::from_str(ORDER).unwrap();
        let second = Order {
            groups: vec![Group {
                buildpacks: vec![BuildpackRef::new("lang-b")],
            }],
        };

        let combined = Order::combine(vec![first.clone(), second]);
        assert_eq!(combined.groups.len(), 3);
        assert_eq!(combined.groups[..2], first.groups[..]);
        assert_eq!(combined.groups[2].ids(), vec!["lang-b"]);
    }

    #[test]
    fn empty_group_file_parses() {
        let group: Group = toml::from_str("").unwrap();
        assert!(group.buildpacks.is_empty());
    }
}
