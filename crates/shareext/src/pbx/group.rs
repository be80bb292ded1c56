//! Group creation and removal.
//!
//! Groups are looked up by name. Names are assumed unique among groups;
//! with duplicates the first group in id order wins.

use super::graph::{Group, Node, ObjectId, ProjectGraph};
use plist::{Dictionary, Value};

/// Outcome of [`ProjectGraph::ensure_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredGroup {
    pub id: ObjectId,
    /// False when the group already existed
    pub created: bool,
}

impl ProjectGraph {
    /// Id of the first group named `name`.
    pub fn find_group(&self, name: &str) -> Option<ObjectId> {
        self.iter().find_map(|(id, node)| match node {
            Node::Group(g) if g.name.as_deref() == Some(name) => Some(id.clone()),
            _ => None,
        })
    }

    /// Create the group `name` under the group `parent_name`, unless it exists.
    ///
    /// An existing group is returned as is, except that it is linked back
    /// under the parent when an earlier removal detached it. A missing parent
    /// leaves the new group unlinked.
    pub fn ensure_group(&mut self, name: &str, path: Option<&str>, parent_name: &str) -> EnsuredGroup {
        let parent = self.find_group(parent_name);
        if parent.is_none() {
            log::warn!("Parent group {parent_name} not found, {name} stays unlinked");
        }

        if let Some(id) = self.find_group(name) {
            log::info!("    {name} group already exists.");
            if let Some(parent) = parent {
                if self.link_child(&parent, &id) {
                    log::info!("    Re-linked {name} group under {parent_name}.");
                }
            }
            return EnsuredGroup { id, created: false };
        }

        let mut extra = Dictionary::new();
        extra.insert("sourceTree".to_string(), Value::String("<group>".to_string()));
        let id = self.insert(Node::Group(Group {
            name: Some(name.to_string()),
            path: path.map(str::to_string),
            children: Vec::new(),
            extra,
        }));

        if let Some(parent) = parent {
            self.link_child(&parent, &id);
        }

        EnsuredGroup { id, created: true }
    }

    /// Unlink the group `name` from `parent_name`.
    ///
    /// The group node and whatever it still contains stay in the graph.
    /// Returns the group id, or `None` when there is no such group.
    pub fn remove_group(&mut self, name: &str, parent_name: &str) -> Option<ObjectId> {
        let Some(id) = self.find_group(name) else {
            log::info!("    {name} group not found, nothing to remove.");
            return None;
        };

        match self.find_group(parent_name) {
            Some(parent) => {
                self.unlink_child(&parent, &id);
            }
            None => log::warn!("Parent group {parent_name} not found"),
        }

        Some(id)
    }

    /// Append `child` to `parent`'s children unless already present.
    ///
    /// Returns true if the child was added.
    pub fn link_child(&mut self, parent: &str, child: &str) -> bool {
        match self.group_mut(parent) {
            Some(group) if !group.children.iter().any(|c| c == child) => {
                group.children.push(child.to_string());
                true
            }
            _ => false,
        }
    }

    /// Drop every occurrence of `child` from `parent`'s children.
    ///
    /// Returns true if anything was removed.
    pub fn unlink_child(&mut self, parent: &str, child: &str) -> bool {
        match self.group_mut(parent) {
            Some(group) => {
                let before = group.children.len();
                group.children.retain(|c| c != child);
                group.children.len() != before
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pbx::graph::tests::fixture;
    use super::*;

    const CUSTOM_TEMPLATE: &str = "29B97314FDCFA39411CA2CEA";

    #[test]
    fn test_ensure_group_creates_and_links() {
        let mut graph = fixture();
        let before = graph.len();

        let group = graph.ensure_group("ShareExtension", Some("ShareExtension"), "CustomTemplate");
        assert!(group.created);
        assert_eq!(graph.len(), before + 1);

        let node = graph.group(&group.id).unwrap();
        assert_eq!(node.name.as_deref(), Some("ShareExtension"));
        assert_eq!(node.path.as_deref(), Some("ShareExtension"));
        assert!(node.children.is_empty());

        let parent = graph.group(CUSTOM_TEMPLATE).unwrap();
        assert_eq!(parent.children.last(), Some(&group.id));
        graph.validate().unwrap();
    }

    #[test]
    fn test_ensure_group_is_idempotent() {
        let mut graph = fixture();
        let first = graph.ensure_group("ShareExtension", None, "CustomTemplate");
        let len = graph.len();
        let second = graph.ensure_group("ShareExtension", None, "CustomTemplate");

        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(graph.len(), len);

        let parent = graph.group(CUSTOM_TEMPLATE).unwrap();
        assert_eq!(parent.children.iter().filter(|c| **c == first.id).count(), 1);
    }

    #[test]
    fn test_remove_group_unlinks_but_keeps_node() {
        let mut graph = fixture();
        let group = graph.ensure_group("ShareExtension", None, "CustomTemplate");

        let removed = graph.remove_group("ShareExtension", "CustomTemplate");
        assert_eq!(removed.as_ref(), Some(&group.id));
        assert!(graph.contains(&group.id));
        assert!(!graph.group(CUSTOM_TEMPLATE).unwrap().children.contains(&group.id));
    }

    #[test]
    fn test_remove_missing_group_is_noop() {
        let mut graph = fixture();
        let before = graph.clone();
        assert_eq!(graph.remove_group("ShareExtension", "CustomTemplate"), None);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_ensure_relinks_detached_group() {
        let mut graph = fixture();
        let group = graph.ensure_group("ShareExtension", None, "CustomTemplate");
        graph.remove_group("ShareExtension", "CustomTemplate");

        let again = graph.ensure_group("ShareExtension", None, "CustomTemplate");
        assert!(!again.created);
        assert_eq!(again.id, group.id);
        assert!(graph.group(CUSTOM_TEMPLATE).unwrap().children.contains(&group.id));
    }

    #[test]
    fn test_missing_parent_leaves_group_unlinked() {
        let mut graph = fixture();
        let group = graph.ensure_group("ShareExtension", None, "NoSuchGroup");
        assert!(group.created);
        let linked = graph.iter().any(|(_, node)| match node {
            Node::Group(g) => g.children.contains(&group.id),
            _ => false,
        });
        assert!(!linked);
    }
}
