//! # Validated Fields
//!
//! Field kinds, canonical paths, and the per-pass validation objects handed to
//! validators. Objects are built fresh for every pass and never stored.

use form_tree::{EnableWhen, Item, ItemType, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The field families that have a validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKind {
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "enableWhen")]
    EnableWhen,
    #[serde(rename = "linkId")]
    LinkId,
}

impl FieldKind {
    /// Registered validators, in the order a batch pass runs them for each node.
    pub const ALL: [FieldKind; 3] = [FieldKind::Type, FieldKind::EnableWhen, FieldKind::LinkId];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::EnableWhen => "enableWhen",
            Self::LinkId => "linkId",
        }
    }

    pub fn canonical_path(&self) -> &'static str {
        match self {
            Self::Type => "/type",
            Self::EnableWhen => "/enableWhen",
            Self::LinkId => "/linkId",
        }
    }

    /// Maps a canonical path coming from a form widget back to its validator.
    pub fn from_canonical_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.canonical_path() == path)
    }

    /// Extracts this field from an item. LinkId values carry no previous value.
    pub fn extract(&self, item: &Item) -> FieldValue {
        match self {
            Self::Type => FieldValue::Type(item.item_type.clone()),
            Self::EnableWhen => FieldValue::EnableWhen(item.enable_when.clone()),
            Self::LinkId => FieldValue::LinkId {
                previous: None,
                value: item.link_id.clone(),
            },
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `/enableWhen/0/question` -> `enableWhen.0.question`.
pub fn canonical_path_notation(canonical_path: &str) -> String {
    canonical_path.trim_matches('/').replace('/', ".")
}

/// Last property of a notation: `enableWhen.0.question` -> `question`.
pub fn property_of_notation(notation: &str) -> &str {
    notation.rsplit('.').next().unwrap_or(notation)
}

/// Current value of a validated field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// `None` for an item without a type.
    Type(Option<ItemType>),
    EnableWhen(Vec<EnableWhen>),
    LinkId {
        /// Value before the edit, when the host knows it.
        previous: Option<String>,
        value: Option<String>,
    },
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Type(_) => FieldKind::Type,
            Self::EnableWhen(_) => FieldKind::EnableWhen,
            Self::LinkId { .. } => FieldKind::LinkId,
        }
    }
}

/// Everything a validator needs to know about one field of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationObject {
    pub id: NodeId,
    /// The node's linkId, recorded alongside status entries.
    pub link_id: Option<String>,
    pub canonical_path: String,
    pub canonical_path_notation: String,
    pub value: FieldValue,
}

impl ValidationObject {
    pub fn new(id: NodeId, link_id: Option<String>, value: FieldValue) -> Self {
        let canonical_path = value.kind().canonical_path().to_string();
        Self {
            id,
            link_id,
            canonical_path_notation: canonical_path_notation(&canonical_path),
            canonical_path,
            value,
        }
    }

    /// Snapshot of `field` taken from `item`. The item data is copied, so later edits
    /// to the tree do not leak into this object.
    pub fn from_item(id: NodeId, item: &Item, field: FieldKind) -> Self {
        Self::new(id, item.link_id.clone(), field.extract(item))
    }

    /// A linkId edit from `previous` to `value`.
    pub fn link_id_edit(id: NodeId, previous: Option<&str>, value: &str) -> Self {
        let value = (!value.is_empty()).then(|| value.to_string());
        Self::new(
            id,
            value.clone(),
            FieldValue::LinkId {
                previous: previous.map(str::to_string),
                value,
            },
        )
    }

    pub fn field(&self) -> FieldKind {
        self.value.kind()
    }
}

/// Path, notation and value of one sub-field of an enableWhen condition.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionField<T> {
    pub canonical_path: String,
    pub canonical_path_notation: String,
    pub value: T,
}

impl<T> ConditionField<T> {
    fn new(index: usize, field_name: &str, value: T) -> Self {
        Self {
            canonical_path: format!("/enableWhen/{index}/{field_name}"),
            canonical_path_notation: format!("enableWhen.{index}.{field_name}"),
            value,
        }
    }
}

/// One enableWhen condition, resolved against the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct EnableWhenValidationObject {
    pub id: NodeId,
    pub link_id: Option<String>,
    pub index: usize,
    pub question: ConditionField<Option<String>>,
    pub operator: ConditionField<Option<String>>,
    /// Type of the referenced question, `None` when the linkId resolves to nothing
    /// or to an item without a type.
    pub answer_type: Option<ItemType>,
    /// Typed answer field derived from `answer_type` (`answerString` when unresolved).
    pub answer_field: &'static str,
    pub answer: ConditionField<Option<Value>>,
}

impl EnableWhenValidationObject {
    pub fn new(
        id: NodeId,
        link_id: Option<String>,
        index: usize,
        condition: &EnableWhen,
        answer_type: Option<ItemType>,
    ) -> Self {
        let answer_field = answer_type
            .as_ref()
            .unwrap_or(&ItemType::String)
            .answer_field_name();
        Self {
            id,
            link_id,
            index,
            question: ConditionField::new(index, "question", condition.question.clone()),
            operator: ConditionField::new(index, "operator", condition.operator.clone()),
            answer_type,
            answer_field,
            answer: ConditionField::new(index, answer_field, condition.answer(answer_field).cloned()),
        }
    }
}
