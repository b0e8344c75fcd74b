//! # Errors
//!
//! Two families live here and must not be confused:
//! - `ValidationError` is a *value*: the user typed something invalid. Validators
//!   return it and store it in the status table. It is never propagated with `?`.
//! - `ValidationFault` / `BatchError` / `ConfigError` are real failures of the engine
//!   or its environment.

use crate::field::FieldKind;
use form_tree::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable code of a validation error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Required,
    Pattern,
    DuplicateLinkId,
    MaxLength,
    InvalidType,
    InvalidQuestion,
    EnablewhenAnswerRequired,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "REQUIRED",
            Self::Pattern => "PATTERN",
            Self::DuplicateLinkId => "DUPLICATE_LINK_ID",
            Self::MaxLength => "MAX_LENGTH",
            Self::InvalidType => "INVALID_TYPE",
            Self::InvalidQuestion => "INVALID_QUESTION",
            Self::EnablewhenAnswerRequired => "ENABLEWHEN_ANSWER_REQUIRED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpolation parameters attached to a validation error.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorParams {
    /// Errors about a field of the node itself (`linkId`, `type`).
    #[serde(rename_all = "camelCase")]
    Field {
        link_id: Option<String>,
        node_id: NodeId,
        field: String,
    },
    /// Errors about one enableWhen condition. `answer` is the JSON-encoded answer value.
    Condition {
        question: String,
        operator: String,
        answer: String,
    },
}

/// One field-level validation error.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    /// `#` followed by the canonical path notation, e.g. `#enableWhen.0.question`.
    pub path: String,
    pub params: ErrorParams,
}

impl ValidationError {
    pub fn new(
        code: ErrorCode,
        notation: &str,
        message: impl Into<String>,
        params: ErrorParams,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: format!("#{notation}"),
            params,
        }
    }

    /// Path without the leading `#`.
    pub fn notation(&self) -> &str {
        self.path.trim_start_matches('#')
    }
}

/// A validator could not run at all.
#[derive(Debug, Error)]
pub enum ValidationFault {
    #[error("node {0:?} is not part of the tree")]
    NodeNotFound(NodeId),
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch validation cancelled with {remaining} unit(s) pending")]
    Cancelled { remaining: usize },

    #[error("validating '{field}' of node {node:?} failed")]
    Unit {
        node: NodeId,
        field: FieldKind,
        #[source]
        source: ValidationFault,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid validation config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
