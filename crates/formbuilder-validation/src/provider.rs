use form_tree::{Item, NodeId, QuestionnaireTree};

/// Read access to the item tree that validation needs.
///
/// The validation core never mutates the tree; it only reads items and walks
/// parent/child links while it updates its own status and linkId tables.
pub trait TreeProvider {
    fn item(&self, id: NodeId) -> Option<&Item>;

    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Children of `id` in display order, empty for leaves and unknown ids.
    fn children(&self, id: NodeId) -> &[NodeId];

    /// Every node carrying `link_id` (0..n matches).
    fn find_by_link_id(&self, link_id: &str) -> Vec<NodeId>;

    /// Every node, parents before children.
    fn validation_nodes(&self) -> Vec<NodeId>;

    fn link_id(&self, id: NodeId) -> Option<&str> {
        self.item(id).and_then(Item::link_id)
    }
}

impl TreeProvider for QuestionnaireTree {
    fn item(&self, id: NodeId) -> Option<&Item> {
        QuestionnaireTree::item(self, id)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        QuestionnaireTree::parent(self, id)
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        QuestionnaireTree::children(self, id)
    }

    fn find_by_link_id(&self, link_id: &str) -> Vec<NodeId> {
        QuestionnaireTree::find_by_link_id(self, link_id)
    }

    fn validation_nodes(&self) -> Vec<NodeId> {
        QuestionnaireTree::validation_nodes(self)
    }
}
