//! # Node Status Table
//!
//! Per-node error state, read by the host to decorate the tree.
//!
//! Invariant: `child_has_error(N)` holds iff some descendant of `N` has `has_error`.
//! It is maintained incrementally by the two ancestor walks below; nothing here
//! rescans the whole tree.

use crate::error::ValidationError;
use crate::field::FieldKind;
use crate::provider::TreeProvider;
use form_tree::NodeId;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Validation state of one node.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// linkId of the node at the last status write.
    pub link_id: String,
    /// This node has at least one field error.
    pub has_error: bool,
    /// Some descendant has a field error.
    pub child_has_error: bool,
    pub errors: BTreeMap<FieldKind, Vec<ValidationError>>,
}

impl NodeStatus {
    fn new(link_id: Option<&str>) -> Self {
        Self {
            link_id: link_id.unwrap_or_default().to_string(),
            ..Default::default()
        }
    }

    /// Errors of the node itself or anywhere below it.
    pub fn subtree_has_error(&self) -> bool {
        self.has_error || self.child_has_error
    }

    pub fn field_errors(&self, field: FieldKind) -> &[ValidationError] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Clone, Debug, Default)]
pub struct NodeStatusTable {
    statuses: HashMap<NodeId, NodeStatus>,
}

impl NodeStatusTable {
    pub fn get(&self, id: NodeId) -> Option<&NodeStatus> {
        self.statuses.get(&id)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeStatus)> {
        self.statuses.iter().map(|(&id, status)| (id, status))
    }

    /// Adds an empty entry for `id` unless one exists.
    pub fn insert_if_absent(&mut self, id: NodeId, link_id: Option<&str>) {
        self.statuses
            .entry(id)
            .or_insert_with(|| NodeStatus::new(link_id));
    }

    pub fn remove(&mut self, id: NodeId) -> Option<NodeStatus> {
        self.statuses.remove(&id)
    }

    /// Whether `id` has an error, optionally counting errors in its subtree.
    pub fn has_error(&self, id: NodeId, include_children: bool) -> bool {
        self.statuses.get(&id).is_some_and(|s| {
            if include_children {
                s.subtree_has_error()
            } else {
                s.has_error
            }
        })
    }

    fn subtree_has_error(&self, id: NodeId) -> bool {
        self.has_error(id, true)
    }

    fn entry<P: TreeProvider>(&mut self, tree: &P, id: NodeId) -> &mut NodeStatus {
        self.statuses
            .entry(id)
            .or_insert_with(|| NodeStatus::new(tree.link_id(id)))
    }

    /// Replaces the error list of one field and re-propagates the node's error state.
    ///
    /// `None` (or an empty list) clears the field.
    pub fn update_validation_status<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
        link_id: Option<&str>,
        field: FieldKind,
        errors: Option<&[ValidationError]>,
    ) {
        let status = self.entry(tree, id);
        if let Some(link_id) = link_id {
            status.link_id = link_id.to_string();
        }
        match errors {
            Some(errors) if !errors.is_empty() => {
                status.errors.insert(field, errors.to_vec());
            }
            _ => {
                status.errors.remove(&field);
            }
        }
        status.has_error = !status.errors.is_empty();
        let has_error = status.has_error;

        if has_error {
            self.add_error_for_ancestor_nodes(tree, id);
        } else {
            self.remove_error_from_ancestor_nodes(tree, id);
        }
    }

    /// Flags every ancestor of `id` as having a descendant error.
    ///
    /// Stops at the first ancestor that is already flagged: by the invariant, all of
    /// its own ancestors are flagged too.
    pub fn add_error_for_ancestor_nodes<P: TreeProvider>(&mut self, tree: &P, id: NodeId) {
        let mut current = tree.parent(id);
        while let Some(ancestor) = current {
            let status = self.entry(tree, ancestor);
            if status.child_has_error {
                break;
            }
            status.child_has_error = true;
            current = tree.parent(ancestor);
        }
    }

    /// Clears descendant-error flags that no longer hold after `id` lost an error.
    ///
    /// First refreshes `id`'s own flag from its direct children, then climbs: as long
    /// as neither the current node nor any of its siblings has an error in its subtree,
    /// the parent is cleared and the walk moves up. It stops at the root or at the first
    /// parent that still has a descendant error.
    pub fn remove_error_from_ancestor_nodes<P: TreeProvider>(&mut self, tree: &P, id: NodeId) {
        let children_have_error = tree
            .children(id)
            .iter()
            .any(|&child| self.subtree_has_error(child));
        if children_have_error {
            self.entry(tree, id).child_has_error = true;
        } else if let Some(status) = self.statuses.get_mut(&id) {
            status.child_has_error = false;
        }

        let mut current = id;
        while let Some(parent) = tree.parent(current) {
            let branch_has_error = tree
                .children(parent)
                .iter()
                .any(|&child| self.subtree_has_error(child));
            if branch_has_error {
                break;
            }
            if let Some(status) = self.statuses.get_mut(&parent) {
                status.child_has_error = false;
            }
            current = parent;
        }
    }
}
