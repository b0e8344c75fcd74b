//! # FormTree
//!
//! `form_tree` is the headless item tree behind the questionnaire form builder.
//! It stores the items a user edits, and nothing else: error decorations, linkId
//! bookkeeping and validation live in `formbuilder_validation`, which reads this tree.
//!
//! ## Core Architecture
//! - **Model (`src/model.rs`)**: Stores the item tree in a flat arena (SlotMap).
//! - **Persistence (`src/persistence.rs`)**: Imports/exports FHIR Questionnaire JSON.
//! - **Operators (`src/operators.rs`)**: enableWhen operator vocabulary per item type.

pub mod error;
pub mod model;
pub mod operators;
pub mod persistence;

// Re-exports for convenience
pub use error::TreeError;
pub use model::{EnableWhen, Item, ItemType, Node, NodeId, QuestionnaireTree};
pub use operators::Operator;
pub use persistence::Questionnaire;
