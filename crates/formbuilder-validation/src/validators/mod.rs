//! Field validators, one module per validated field family.
//!
//! Each validator returns `None` when the field is valid and `Some(errors)` otherwise,
//! and records its result in the context's status table (always in edit mode, only
//! on errors in batch mode).

pub mod enable_when;
pub mod item_type;
pub mod link_id;
