//! # enableWhen Operators
//!
//! The comparison operators a condition may use, and which of them make sense for
//! the type of the referenced question.

use crate::model::ItemType;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "notexists")]
    NotExists,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
}

/// Every operator, in the order the editor lists them.
pub const ALL_OPERATORS: &[Operator] = &[
    Operator::Exists,
    Operator::NotExists,
    Operator::Equal,
    Operator::NotEqual,
    Operator::Greater,
    Operator::Less,
    Operator::GreaterOrEqual,
    Operator::LessOrEqual,
];

/// Presence and equality checks only, for types without an ordering.
pub const EQUALITY_OPERATORS: &[Operator] = &[
    Operator::Exists,
    Operator::NotExists,
    Operator::Equal,
    Operator::NotEqual,
];

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        ALL_OPERATORS.iter().copied().find(|op| op.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::NotExists => "notexists",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }

    /// Label shown in the operator drop-down.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exists => "Not empty",
            Self::NotExists => "Empty",
            other => other.as_str(),
        }
    }

    /// `exists` / `notexists` test presence and take no answer value.
    pub fn is_presence_check(&self) -> bool {
        matches!(self, Self::Exists | Self::NotExists)
    }
}

/// Operators offered for a question of the given type.
///
/// Types outside the enableWhen vocabulary (group, display, choice, ...) get none.
pub fn operators_for(item_type: &ItemType) -> &'static [Operator] {
    match item_type {
        ItemType::Decimal
        | ItemType::Integer
        | ItemType::Quantity
        | ItemType::Date
        | ItemType::DateTime
        | ItemType::Time
        | ItemType::String
        | ItemType::Text => ALL_OPERATORS,
        ItemType::Url
        | ItemType::Boolean
        | ItemType::Coding
        | ItemType::Attachment
        | ItemType::Reference => EQUALITY_OPERATORS,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(Operator::parse(">="), Some(Operator::GreaterOrEqual));
        assert_eq!(Operator::parse("exists"), Some(Operator::Exists));
        assert_eq!(Operator::parse("~"), None);
    }

    #[test]
    fn test_operators_by_type() {
        assert_eq!(operators_for(&ItemType::Integer).len(), 8);
        assert_eq!(operators_for(&ItemType::Boolean), EQUALITY_OPERATORS);
        assert!(operators_for(&ItemType::Display).is_empty());
        assert_eq!(Operator::NotExists.label(), "Empty");
        assert_eq!(Operator::Less.label(), "<");
    }
}
