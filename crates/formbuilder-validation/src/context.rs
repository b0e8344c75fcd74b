//! # Validation Context
//!
//! Owns every piece of mutable validation state of one document: the node status
//! table, the linkId index and the configuration. Validators take it by `&mut`, so
//! there is exactly one writer at a time.

use crate::config::ValidationConfig;
use crate::error::{ValidationError, ValidationFault};
use crate::field::{FieldKind, FieldValue, ValidationObject};
use crate::provider::TreeProvider;
use crate::status::{NodeStatus, NodeStatusTable};
use crate::tracker::LinkIdTracker;
use crate::validators::{enable_when, item_type, link_id};
use form_tree::NodeId;
use std::collections::BTreeSet;

/// How a validator records its result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Interactive edit: the status is always rewritten, clean results included.
    #[default]
    Edit,
    /// Load/import pass: only errors are written.
    Batch,
}

#[derive(Debug, Default)]
pub struct ValidationContext {
    pub(crate) status: NodeStatusTable,
    pub(crate) link_ids: LinkIdTracker,
    pub(crate) config: ValidationConfig,
}

impl ValidationContext {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn status_table(&self) -> &NodeStatusTable {
        &self.status
    }

    pub fn link_ids(&self) -> &LinkIdTracker {
        &self.link_ids
    }

    pub fn status(&self, id: NodeId) -> Option<&NodeStatus> {
        self.status.get(id)
    }

    pub fn has_error(&self, id: NodeId, include_children: bool) -> bool {
        self.status.has_error(id, include_children)
    }

    /// No node carries an error.
    pub fn is_clean(&self) -> bool {
        self.status.iter().all(|(_, status)| !status.has_error)
    }

    /// Every recorded error with the node that owns it, in field order per node.
    pub fn errors(&self) -> impl Iterator<Item = (NodeId, &ValidationError)> {
        self.status.iter().flat_map(|(id, status)| {
            status
                .errors
                .values()
                .flat_map(move |errors| errors.iter().map(move |error| (id, error)))
        })
    }

    pub(crate) fn should_record(&self, mode: ValidationMode, has_errors: bool) -> bool {
        match mode {
            ValidationMode::Edit => true,
            ValidationMode::Batch => has_errors || self.config.batch_writes_clean_results,
        }
    }

    /// Runs the validator registered for the object's field.
    #[tracing::instrument(level = "trace", skip(self, tree, object), fields(node = ?object.id, field = %object.field()))]
    pub fn validate_field<P: TreeProvider>(
        &mut self,
        tree: &P,
        object: &ValidationObject,
        mode: ValidationMode,
    ) -> Result<Option<Vec<ValidationError>>, ValidationFault> {
        match &object.value {
            FieldValue::Type(ty) => item_type::validate_type(self, tree, object, ty.as_ref(), mode),
            FieldValue::EnableWhen(conditions) => Ok(enable_when::validate_enable_when_all(
                self, tree, object, conditions, mode,
            )),
            FieldValue::LinkId { previous, value } => Ok(link_id::validate_link_id(
                self,
                tree,
                object,
                previous.as_deref(),
                value.as_deref(),
                mode,
            )),
        }
    }

    /// A linkId edit of node `id` from `previous` to `value`.
    pub fn validate_link_id<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
        previous: Option<&str>,
        value: &str,
    ) -> Option<Vec<ValidationError>> {
        let object = ValidationObject::link_id_edit(id, previous, value);
        link_id::validate_link_id(
            self,
            tree,
            &object,
            previous,
            (!value.is_empty()).then_some(value),
            ValidationMode::Edit,
        )
    }

    /// Re-runs one field validator against the node's current item.
    pub fn validate_node_field<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
        field: FieldKind,
        mode: ValidationMode,
    ) -> Result<Option<Vec<ValidationError>>, ValidationFault> {
        let item = tree.item(id).ok_or(ValidationFault::NodeNotFound(id))?;
        let object = ValidationObject::from_item(id, item, field);
        self.validate_field(tree, &object, mode)
    }

    pub fn validate_type<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
    ) -> Result<Option<Vec<ValidationError>>, ValidationFault> {
        self.validate_node_field(tree, id, FieldKind::Type, ValidationMode::Edit)
    }

    pub fn validate_enable_when<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
    ) -> Result<Option<Vec<ValidationError>>, ValidationFault> {
        self.validate_node_field(tree, id, FieldKind::EnableWhen, ValidationMode::Edit)
    }

    /// Runs every registered validator on `id` and returns all errors found.
    pub fn validate_node<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
        mode: ValidationMode,
    ) -> Result<Vec<ValidationError>, ValidationFault> {
        let mut errors = Vec::new();
        for field in FieldKind::ALL {
            if let Some(found) = self.validate_node_field(tree, id, field, mode)? {
                errors.extend(found);
            }
        }
        Ok(errors)
    }

    /// Creates an empty status entry for every node of the tree. Existing entries
    /// are kept.
    pub fn seed_from_tree<P: TreeProvider>(&mut self, tree: &P) {
        let nodes = tree.validation_nodes();
        for &id in &nodes {
            self.status.insert_if_absent(id, tree.link_id(id));
        }
        tracing::debug!(nodes = nodes.len(), "Status table seeded");
    }

    pub fn add_node_status(&mut self, id: NodeId, link_id: Option<&str>) {
        self.status.insert_if_absent(id, link_id);
    }

    pub fn remove_node_status(&mut self, id: NodeId) -> Option<NodeStatus> {
        self.status.remove(id)
    }

    /// Hook for a node freshly added to the tree: seeds its status and re-checks
    /// whether its parent may own children.
    pub fn node_added<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
    ) -> Result<(), ValidationFault> {
        let item = tree.item(id).ok_or(ValidationFault::NodeNotFound(id))?;
        self.status.insert_if_absent(id, item.link_id());
        if let Some(parent) = tree.parent(id) {
            self.validate_type(tree, parent)?;
        }
        Ok(())
    }

    /// Hook for a node the tree already moved under a new parent.
    pub fn node_moved<P: TreeProvider>(
        &mut self,
        tree: &P,
        id: NodeId,
        former_parent: Option<NodeId>,
    ) -> Result<(), ValidationFault> {
        if let Some(former) = former_parent {
            self.status.remove_error_from_ancestor_nodes(tree, former);
            self.validate_type(tree, former)?;
        }
        if self.status.has_error(id, true) {
            self.status.add_error_for_ancestor_nodes(tree, id);
        }
        if let Some(parent) = tree.parent(id) {
            self.validate_type(tree, parent)?;
        }
        Ok(())
    }

    /// Drops all state of a subtree the tree already removed.
    ///
    /// `removed` lists the ids of the subtree. A holder left alone on a linkId that
    /// was duplicated with a removed node loses its duplicate error, and the former
    /// parent's chain is re-propagated.
    #[tracing::instrument(skip(self, tree, removed), fields(removed = removed.len()))]
    pub fn forget_subtree<P: TreeProvider>(
        &mut self,
        tree: &P,
        former_parent: Option<NodeId>,
        removed: &[NodeId],
    ) {
        let mut released = BTreeSet::new();
        for &id in removed {
            self.status.remove(id);
            if let Some(link_id) = self.link_ids.remove_node(id) {
                released.insert(link_id);
            }
        }

        for value in &released {
            let sole = match self.link_ids.node_ids(value) {
                [sole] => *sole,
                _ => continue,
            };
            link_id::clear_duplicate(self, tree, sole);
        }

        if let Some(parent) = former_parent {
            self.status.remove_error_from_ancestor_nodes(tree, parent);
        }
    }

    /// Re-validates the conditions of every node that references one of `link_ids`.
    /// Returns the nodes that were re-validated, in tree order.
    pub fn revalidate_references<P: TreeProvider>(
        &mut self,
        tree: &P,
        link_ids: &[&str],
    ) -> Vec<NodeId> {
        let referencing: Vec<NodeId> = tree
            .validation_nodes()
            .into_iter()
            .filter(|&id| {
                tree.item(id).is_some_and(|item| {
                    item.enable_when.iter().any(|condition| {
                        condition
                            .question
                            .as_deref()
                            .is_some_and(|q| link_ids.contains(&q))
                    })
                })
            })
            .collect();

        for &id in &referencing {
            if let Some(item) = tree.item(id) {
                let object = ValidationObject::from_item(id, item, FieldKind::EnableWhen);
                if let FieldValue::EnableWhen(conditions) = &object.value {
                    enable_when::validate_enable_when_all(
                        self,
                        tree,
                        &object,
                        conditions,
                        ValidationMode::Edit,
                    );
                }
            }
        }

        tracing::debug!(?link_ids, nodes = referencing.len(), "References revalidated");
        referencing
    }
}
