use crate::config::ValidationConfig;
use crate::context::{ValidationContext, ValidationMode};
use crate::error::{ErrorCode, ErrorParams, ValidationError};
use crate::field::{FieldKind, ValidationObject};
use crate::provider::TreeProvider;
use crate::tracker::{LinkIdOutcome, LinkIdPlan, LinkIdTracker, plan_link_id_change};
use form_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens separated by single whitespace characters, nothing leading or trailing.
static LINK_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s]+(\s[^\s]+)*$").expect("linkId pattern compiles"));

pub fn is_valid_pattern(value: &str) -> bool {
    LINK_ID_PATTERN.is_match(value)
}

fn field_params(link_id: Option<&str>, node_id: NodeId, notation: &str) -> ErrorParams {
    ErrorParams::Field {
        link_id: link_id.map(str::to_string),
        node_id,
        field: notation.to_string(),
    }
}

fn duplicate_error(link_id: &str, node_id: NodeId, notation: &str) -> ValidationError {
    ValidationError::new(
        ErrorCode::DuplicateLinkId,
        notation,
        "Entered linkId is already used.",
        field_params(Some(link_id), node_id, notation),
    )
}

/// Runs the linkId checks in order and returns the first failure.
///
/// Pure: the tracker is only read.
pub fn check_link_id(
    tracker: &LinkIdTracker,
    config: &ValidationConfig,
    object: &ValidationObject,
    previous: Option<&str>,
    value: Option<&str>,
) -> Option<ValidationError> {
    let notation = object.canonical_path_notation.as_str();
    let id = object.id;

    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Some(ValidationError::new(
            ErrorCode::Required,
            notation,
            "Link Id is required.",
            field_params(previous, id, notation),
        ));
    };

    if !is_valid_pattern(value) {
        return Some(ValidationError::new(
            ErrorCode::Pattern,
            notation,
            "Spaces are not allowed at the beginning or end, and only a single space is allowed between words.",
            field_params(Some(value), id, notation),
        ));
    }

    if tracker.has_duplicate(value, id) {
        return Some(duplicate_error(value, id, notation));
    }

    if value.chars().count() > config.max_link_id_length {
        return Some(ValidationError::new(
            ErrorCode::MaxLength,
            notation,
            format!(
                "LinkId cannot exceed {} characters.",
                config.max_link_id_length
            ),
            field_params(Some(value), id, notation),
        ));
    }

    None
}

/// Validates a linkId edit and keeps the linkId index and the duplicate flags of
/// the other holders in step with it.
pub(crate) fn validate_link_id<P: TreeProvider>(
    ctx: &mut ValidationContext,
    tree: &P,
    object: &ValidationObject,
    previous: Option<&str>,
    value: Option<&str>,
    mode: ValidationMode,
) -> Option<Vec<ValidationError>> {
    let error = check_link_id(&ctx.link_ids, &ctx.config, object, previous, value);
    let outcome = match &error {
        None => LinkIdOutcome::Valid,
        Some(e) if e.code == ErrorCode::DuplicateLinkId => LinkIdOutcome::Duplicate,
        Some(_) => LinkIdOutcome::Invalid,
    };
    let errors = error.map(|e| vec![e]);
    let next = value.unwrap_or_default();

    let LinkIdPlan {
        tracker,
        previous,
        flag,
        clear,
    } = plan_link_id_change(&ctx.link_ids, object.id, previous, next, outcome);
    ctx.link_ids = tracker;

    if ctx.should_record(mode, errors.is_some()) {
        ctx.status.update_validation_status(
            tree,
            object.id,
            value,
            FieldKind::LinkId,
            errors.as_deref(),
        );
    }
    for id in &flag {
        flag_duplicate(ctx, tree, *id, next);
    }
    for id in &clear {
        clear_duplicate(ctx, tree, *id);
    }

    tracing::debug!(
        node_id = ?object.id,
        previous = ?previous,
        value = next,
        ?outcome,
        flagged = flag.len(),
        cleared = clear.len(),
        "linkId validated"
    );
    errors
}

/// Marks `id` as a holder of the duplicated `link_id`.
pub(crate) fn flag_duplicate<P: TreeProvider>(
    ctx: &mut ValidationContext,
    tree: &P,
    id: NodeId,
    link_id: &str,
) {
    let notation = FieldKind::LinkId.name();
    let errors = [duplicate_error(link_id, id, notation)];
    ctx.status
        .update_validation_status(tree, id, Some(link_id), FieldKind::LinkId, Some(&errors));
}

/// Drops the duplicate error of `id`, leaving any other linkId error alone.
pub(crate) fn clear_duplicate<P: TreeProvider>(ctx: &mut ValidationContext, tree: &P, id: NodeId) {
    let Some(errors) = ctx.status.get(id).map(|s| s.field_errors(FieldKind::LinkId)) else {
        return;
    };
    if !errors.iter().any(|e| e.code == ErrorCode::DuplicateLinkId) {
        return;
    }
    let remaining: Vec<ValidationError> = errors
        .iter()
        .filter(|e| e.code != ErrorCode::DuplicateLinkId)
        .cloned()
        .collect();
    ctx.status
        .update_validation_status(tree, id, None, FieldKind::LinkId, Some(&remaining));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::canonical_path_notation;
    use form_tree::{Item, ItemType, QuestionnaireTree};

    #[test]
    fn test_pattern() {
        assert!(is_valid_pattern("q1"));
        assert!(is_valid_pattern("body weight"));
        assert!(is_valid_pattern("/29463-7"));
        assert!(!is_valid_pattern(" q1"));
        assert!(!is_valid_pattern("q1 "));
        assert!(!is_valid_pattern("body  weight"));
        assert!(!is_valid_pattern("body\t\tweight"));
    }

    #[test]
    fn test_clear_duplicate_keeps_other_errors() {
        let mut tree = QuestionnaireTree::new();
        let id = tree.add_item(None, Item::new("abcde", ItemType::String)).unwrap();
        let mut ctx = ValidationContext::default();
        let notation = canonical_path_notation(FieldKind::LinkId.canonical_path());
        let errors = vec![
            duplicate_error("abcde", id, &notation),
            ValidationError::new(
                ErrorCode::MaxLength,
                &notation,
                "LinkId cannot exceed 4 characters.",
                field_params(Some("abcde"), id, &notation),
            ),
        ];
        ctx.status
            .update_validation_status(&tree, id, Some("abcde"), FieldKind::LinkId, Some(&errors));

        clear_duplicate(&mut ctx, &tree, id);
        let codes: Vec<ErrorCode> = ctx
            .status(id)
            .unwrap()
            .field_errors(FieldKind::LinkId)
            .iter()
            .map(|e| e.code)
            .collect();
        assert_eq!(codes, vec![ErrorCode::MaxLength]);
        assert!(ctx.has_error(id, false));

        clear_duplicate(&mut ctx, &tree, id);
        assert_eq!(ctx.status(id).unwrap().field_errors(FieldKind::LinkId).len(), 1);
    }
}
