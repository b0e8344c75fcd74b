use crate::context::{ValidationContext, ValidationMode};
use crate::error::{ErrorCode, ErrorParams, ValidationError, ValidationFault};
use crate::field::{FieldKind, ValidationObject};
use crate::provider::TreeProvider;
use form_tree::ItemType;

/// A type that cannot hold sub-items (`display`) must not own children.
pub(crate) fn validate_type<P: TreeProvider>(
    ctx: &mut ValidationContext,
    tree: &P,
    object: &ValidationObject,
    item_type: Option<&ItemType>,
    mode: ValidationMode,
) -> Result<Option<Vec<ValidationError>>, ValidationFault> {
    let mut errors = Vec::new();

    if let Some(item_type) = item_type
        && !item_type.can_have_children()
    {
        if tree.item(object.id).is_none() {
            return Err(ValidationFault::NodeNotFound(object.id));
        }
        if !tree.children(object.id).is_empty() {
            let notation = object.canonical_path_notation.as_str();
            errors.push(ValidationError::new(
                ErrorCode::InvalidType,
                notation,
                format!("'{item_type}' data type cannot contain sub-items."),
                ErrorParams::Field {
                    link_id: object.link_id.clone(),
                    node_id: object.id,
                    field: notation.to_string(),
                },
            ));
        }
    }

    let errors = (!errors.is_empty()).then_some(errors);
    if ctx.should_record(mode, errors.is_some()) {
        ctx.status.update_validation_status(
            tree,
            object.id,
            object.link_id.as_deref(),
            FieldKind::Type,
            errors.as_deref(),
        );
    }
    Ok(errors)
}
