use crate::model::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node {0:?} does not exist in the tree")]
    NodeNotFound(NodeId),

    #[error("index {index} is out of bounds for {len} siblings")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("cannot move node {node:?} under its own descendant {target:?}")]
    CyclicMove { node: NodeId, target: NodeId },

    #[error("expected a Questionnaire resource, found '{0}'")]
    NotAQuestionnaire(String),

    #[error("malformed item at {path}: {source}")]
    MalformedItem {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Questionnaire JSON: {0}")]
    Json(#[from] serde_json::Error),
}
