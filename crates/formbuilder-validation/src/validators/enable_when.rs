use crate::context::{ValidationContext, ValidationMode};
use crate::empty::is_empty_opt;
use crate::error::{ErrorCode, ErrorParams, ValidationError};
use crate::field::{EnableWhenValidationObject, FieldKind, ValidationObject};
use crate::provider::TreeProvider;
use form_tree::{EnableWhen, Operator};
use serde_json::Value;

/// Resolves the condition's question against the tree and builds its validation object.
pub fn create_enable_when_validation_object<P: TreeProvider>(
    tree: &P,
    object: &ValidationObject,
    condition: &EnableWhen,
    index: usize,
) -> EnableWhenValidationObject {
    let answer_type = condition
        .question
        .as_deref()
        .and_then(|question| tree.find_by_link_id(question).first().copied())
        .and_then(|target| tree.item(target))
        .and_then(|item| item.item_type.clone());

    EnableWhenValidationObject::new(
        object.id,
        object.link_id.clone(),
        index,
        condition,
        answer_type,
    )
}

/// Checks one condition. Rows without a question or an operator are still being
/// filled in and are not reported.
pub fn validate_enable_when_single(object: &EnableWhenValidationObject) -> Option<ValidationError> {
    let question = object.question.value.as_deref().unwrap_or_default();
    let operator = object.operator.value.as_deref().unwrap_or_default();
    if question.trim().is_empty() || operator.is_empty() {
        return None;
    }

    let answer = object.answer.value.as_ref();
    let params = ErrorParams::Condition {
        question: question.to_string(),
        operator: operator.to_string(),
        answer: answer.map_or_else(|| Value::Null.to_string(), Value::to_string),
    };

    // A target without a type cannot be answered either.
    if object.answer_type.is_none() {
        return Some(ValidationError::new(
            ErrorCode::InvalidQuestion,
            &object.question.canonical_path_notation,
            format!("Question not found for the linkId '{question}'."),
            params,
        ));
    }

    let presence_check = Operator::parse(operator).is_some_and(|op| op.is_presence_check());
    if !presence_check && is_empty_opt(answer) {
        return Some(ValidationError::new(
            ErrorCode::EnablewhenAnswerRequired,
            &object.answer.canonical_path_notation,
            "Answer field is required when you choose an operator other than 'Not empty' or 'Empty'.",
            params,
        ));
    }

    None
}

/// Validates every condition; errors of all rows are collected, none short-circuits.
pub(crate) fn validate_enable_when_all<P: TreeProvider>(
    ctx: &mut ValidationContext,
    tree: &P,
    object: &ValidationObject,
    conditions: &[EnableWhen],
    mode: ValidationMode,
) -> Option<Vec<ValidationError>> {
    let errors: Vec<ValidationError> = conditions
        .iter()
        .enumerate()
        .filter_map(|(index, condition)| {
            let row = create_enable_when_validation_object(tree, object, condition, index);
            validate_enable_when_single(&row)
        })
        .collect();

    let errors = (!errors.is_empty()).then_some(errors);
    if ctx.should_record(mode, errors.is_some()) {
        ctx.status.update_validation_status(
            tree,
            object.id,
            object.link_id.as_deref(),
            FieldKind::EnableWhen,
            errors.as_deref(),
        );
    }
    errors
}
