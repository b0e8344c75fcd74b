//! # Core Data Models
//!
//! This module defines the item tree edited by the form builder.
//! Nodes live in a flat arena (`SlotMap`), so identifiers are stable, cheap to copy
//! and never reused within a session. Parent links are plain keys, children are an
//! ordered list of keys owned by the parent.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slotmap::SlotMap;
use slotmap::new_key_type;
use std::collections::HashMap;
use std::fmt;

pub use uuid::Uuid;

new_key_type! {
    /// Unique identifier for a tree Node.
    pub struct NodeId;
}

/// FHIR Questionnaire item type.
///
/// Unknown type strings are kept verbatim in `Other` so that export does not lose them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    Group,
    Display,
    Boolean,
    Decimal,
    Integer,
    Date,
    DateTime,
    Time,
    #[default]
    String,
    Text,
    Url,
    Coding,
    Choice,
    OpenChoice,
    Attachment,
    Reference,
    Quantity,
    Other(String),
}

impl ItemType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Group => "group",
            Self::Display => "display",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::Time => "time",
            Self::String => "string",
            Self::Text => "text",
            Self::Url => "url",
            Self::Coding => "coding",
            Self::Choice => "choice",
            Self::OpenChoice => "open-choice",
            Self::Attachment => "attachment",
            Self::Reference => "reference",
            Self::Quantity => "quantity",
            Self::Other(raw) => raw,
        }
    }

    /// Display items are read-only text and may not own sub-items.
    pub fn can_have_children(&self) -> bool {
        !matches!(self, Self::Display)
    }

    /// Name of the typed `answer[x]` field an enableWhen condition must fill
    /// when it points at an item of this type.
    pub fn answer_field_name(&self) -> &'static str {
        match self {
            Self::Boolean => "answerBoolean",
            Self::Decimal => "answerDecimal",
            Self::Integer => "answerInteger",
            Self::Date => "answerDate",
            Self::DateTime => "answerDateTime",
            Self::Time => "answerTime",
            Self::Coding | Self::Choice | Self::OpenChoice => "answerCoding",
            Self::Quantity => "answerQuantity",
            Self::Reference => "answerReference",
            Self::Attachment => "answerAttachment",
            Self::String | Self::Text | Self::Url => "answerString",
            Self::Group | Self::Display | Self::Other(_) => "answerString",
        }
    }
}

impl From<&str> for ItemType {
    fn from(s: &str) -> Self {
        match s {
            "group" => Self::Group,
            "display" => Self::Display,
            "boolean" => Self::Boolean,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "date" => Self::Date,
            "dateTime" => Self::DateTime,
            "time" => Self::Time,
            "string" => Self::String,
            "text" => Self::Text,
            "url" => Self::Url,
            "coding" => Self::Coding,
            "choice" => Self::Choice,
            "open-choice" => Self::OpenChoice,
            "attachment" => Self::Attachment,
            "reference" => Self::Reference,
            "quantity" => Self::Quantity,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ItemType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ItemType> for String {
    fn from(t: ItemType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One condition of an item's `enableWhen` array.
///
/// The typed answer (`answerString`, `answerCoding`, ...) is kept in a flat map because
/// the field that matters depends on the type of the referenced question.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnableWhen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(flatten)]
    pub answers: Map<String, Value>,
}

impl EnableWhen {
    pub fn new(question: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            operator: Some(operator.into()),
            answers: Map::new(),
        }
    }

    pub fn with_answer(mut self, field: impl Into<String>, value: Value) -> Self {
        self.answers.insert(field.into(), value);
        self
    }

    pub fn answer(&self, field: &str) -> Option<&Value> {
        self.answers.get(field)
    }
}

/// Payload of a Node: one Questionnaire item without its nested `item` array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
    /// `None` when the resource carries no `type`. Such an item cannot be the
    /// target of an enableWhen condition.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enable_when: Vec<EnableWhen>,
    /// Every other FHIR field, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(link_id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            link_id: Some(link_id.into()),
            item_type: Some(item_type),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_enable_when(mut self, condition: EnableWhen) -> Self {
        self.enable_when.push(condition);
        self
    }

    pub fn link_id(&self) -> Option<&str> {
        self.link_id.as_deref()
    }

    pub fn item_type(&self) -> Option<&ItemType> {
        self.item_type.as_ref()
    }
}

/// A Node in the item tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// Self-reference ID.
    pub id: NodeId,
    /// Stable UUID, handed out to host widgets that cannot hold slotmap keys.
    pub uuid: Uuid,
    /// Back-reference to the parent, `None` for top-level items.
    pub parent: Option<NodeId>,
    /// Owned children, in display order.
    pub children: Vec<NodeId>,
    /// Questionnaire item payload.
    pub item: Item,
}

/// The item tree of one Questionnaire.
///
/// Holds data only. Validation state lives in the validation crate and refers to
/// nodes by `NodeId`.
#[derive(Clone, Debug)]
pub struct QuestionnaireTree {
    /// Arena for Nodes.
    pub nodes: SlotMap<NodeId, Node>,
    /// Top-level items, in display order.
    pub roots: Vec<NodeId>,
    /// Index for O(1) UUID to NodeId lookup.
    pub uuid_index: HashMap<Uuid, NodeId>,
}

impl Default for QuestionnaireTree {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            uuid_index: HashMap::new(),
        }
    }
}

impl QuestionnaireTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn item(&self, id: NodeId) -> Option<&Item> {
        self.nodes.get(id).map(|n| &n.item)
    }

    pub fn item_mut(&mut self, id: NodeId) -> Option<&mut Item> {
        self.nodes.get_mut(id).map(|n| &mut n.item)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of `id`, or an empty slice for an unknown node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn find_by_uuid(&self, uuid: &Uuid) -> Option<NodeId> {
        self.uuid_index.get(uuid).copied()
    }

    /// Appends an item as the last child of `parent` (or as the last top-level item).
    pub fn add_item(&mut self, parent: Option<NodeId>, item: Item) -> Result<NodeId, TreeError> {
        let position = match parent {
            Some(p) => self.nodes.get(p).ok_or(TreeError::NodeNotFound(p))?.children.len(),
            None => self.roots.len(),
        };
        self.insert_item(parent, position, item)
    }

    /// Inserts an item at `index` among the children of `parent`.
    pub fn insert_item(
        &mut self,
        parent: Option<NodeId>,
        index: usize,
        item: Item,
    ) -> Result<NodeId, TreeError> {
        let len = match parent {
            Some(p) => self.nodes.get(p).ok_or(TreeError::NodeNotFound(p))?.children.len(),
            None => self.roots.len(),
        };
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }

        let uuid = Uuid::new_v4();
        let id = self.nodes.insert_with_key(|key| Node {
            id: key,
            uuid,
            parent,
            children: Vec::new(),
            item,
        });
        self.uuid_index.insert(uuid, id);
        self.siblings_mut(parent).insert(index, id);

        tracing::trace!(node_id = ?id, parent = ?parent, index, "Item added");
        Ok(id)
    }

    /// Removes `id` and its whole subtree.
    ///
    /// Returns the removed ids in pre-order (the removed node first).
    pub fn remove_item(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if !self.nodes.contains_key(id) {
            return Err(TreeError::NodeNotFound(id));
        }
        let removed = self.descendants(id);
        let parent = self.parent(id);
        self.siblings_mut(parent).retain(|&c| c != id);

        for &node_id in &removed {
            if let Some(node) = self.nodes.remove(node_id) {
                self.uuid_index.remove(&node.uuid);
            }
        }

        tracing::trace!(node_id = ?id, removed = removed.len(), "Subtree removed");
        Ok(removed)
    }

    /// Moves `id` (with its subtree) under `new_parent` at `index`.
    ///
    /// Returns the former parent.
    pub fn move_item(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        index: usize,
    ) -> Result<Option<NodeId>, TreeError> {
        if !self.nodes.contains_key(id) {
            return Err(TreeError::NodeNotFound(id));
        }
        if let Some(p) = new_parent {
            if !self.nodes.contains_key(p) {
                return Err(TreeError::NodeNotFound(p));
            }
            if self.is_ancestor_or_self(id, p) {
                return Err(TreeError::CyclicMove { node: id, target: p });
            }
        }

        let old_parent = self.parent(id);
        self.siblings_mut(old_parent).retain(|&c| c != id);

        let len = self.siblings_mut(new_parent).len();
        let index = index.min(len);
        self.siblings_mut(new_parent).insert(index, id);
        self.nodes[id].parent = new_parent;

        Ok(old_parent)
    }

    /// `id` and all of its descendants, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.nodes.contains_key(id) {
            self.collect_pre_order(id, &mut out);
        }
        out
    }

    /// Every node of the tree in pre-order, the order batch validation visits them.
    pub fn validation_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.collect_pre_order(root, &mut out);
        }
        out
    }

    /// All nodes whose item carries `link_id`, in pre-order.
    pub fn find_by_link_id(&self, link_id: &str) -> Vec<NodeId> {
        self.validation_nodes()
            .into_iter()
            .filter(|&id| self.nodes[id].item.link_id() == Some(link_id))
            .collect()
    }

    /// True if `ancestor` is `id` itself or lies on the parent chain of `id`.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    fn collect_pre_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in &self.nodes[id].children {
            self.collect_pre_order(child, out);
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(p) => &mut self.nodes[p].children,
            None => &mut self.roots,
        }
    }
}
