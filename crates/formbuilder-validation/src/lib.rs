//! # Form Builder Validation
//!
//! Field-level and cross-field validation of a questionnaire item tree: linkId
//! rules and uniqueness, item type constraints and `enableWhen` conditions. The
//! engine keeps per-node error state and a descendant-error flag on every ancestor
//! consistent while the tree is edited.
//!
//! All mutable state lives in a [`ValidationContext`]; the tree is only read,
//! through the [`TreeProvider`] trait.

pub mod batch;
pub mod config;
pub mod context;
pub mod empty;
pub mod error;
pub mod field;
pub mod provider;
pub mod status;
pub mod tracker;
pub mod validators;

pub use batch::{BatchReport, BatchRun, BatchValidator, ValidationUnit};
pub use config::ValidationConfig;
pub use context::{ValidationContext, ValidationMode};
pub use error::{
    BatchError, ConfigError, ErrorCode, ErrorParams, ValidationError, ValidationFault,
};
pub use field::{FieldKind, FieldValue, ValidationObject};
pub use provider::TreeProvider;
pub use status::{NodeStatus, NodeStatusTable};
pub use tracker::LinkIdTracker;
