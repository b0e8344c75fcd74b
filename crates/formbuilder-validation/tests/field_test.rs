use form_tree::{EnableWhen, Item, ItemType, NodeId, QuestionnaireTree};
use formbuilder_validation::{
    ErrorCode, ErrorParams, FieldKind, FieldValue, ValidationContext, ValidationFault,
    ValidationMode, ValidationObject,
};
use serde_json::{Value, json};

/// `q1` (string), `q2` (integer), `q3` (choice), plus one dependent item carrying
/// the given conditions.
fn tree_with_conditions(conditions: Vec<EnableWhen>) -> (QuestionnaireTree, NodeId) {
    let mut tree = QuestionnaireTree::new();
    tree.add_item(None, Item::new("q1", ItemType::String)).unwrap();
    tree.add_item(None, Item::new("q2", ItemType::Integer)).unwrap();
    tree.add_item(None, Item::new("q3", ItemType::Choice)).unwrap();
    let mut item = Item::new("dependent", ItemType::String);
    item.enable_when = conditions;
    let dependent = tree.add_item(None, item).unwrap();
    (tree, dependent)
}

#[test]
fn test_display_with_child() {
    let mut tree = QuestionnaireTree::new();
    let display = tree
        .add_item(None, Item::new("c", ItemType::Display).with_text("Read me"))
        .unwrap();
    let mut ctx = ValidationContext::default();
    assert_eq!(ctx.validate_type(&tree, display).unwrap(), None);

    let child = tree
        .add_item(Some(display), Item::new("c.1", ItemType::String))
        .unwrap();
    ctx.node_added(&tree, child).unwrap();

    let status = ctx.status(display).unwrap();
    let errors = status.field_errors(FieldKind::Type);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::InvalidType);
    assert_eq!(errors[0].message, "'display' data type cannot contain sub-items.");
    assert_eq!(errors[0].path, "#type");
    assert!(status.has_error);

    // Moving the child out resolves the error.
    tree.move_item(child, None, 0).unwrap();
    ctx.node_moved(&tree, child, Some(display)).unwrap();
    assert!(!ctx.has_error(display, true));
}

#[test]
fn test_group_may_own_children() {
    let mut tree = QuestionnaireTree::new();
    let group = tree.add_item(None, Item::new("g", ItemType::Group)).unwrap();
    tree.add_item(Some(group), Item::new("q", ItemType::String)).unwrap();
    let mut ctx = ValidationContext::default();

    assert_eq!(ctx.validate_type(&tree, group).unwrap(), None);
    assert!(!ctx.has_error(group, true));
}

#[test]
fn test_batch_mode_skips_clean_type_write() {
    let mut tree = QuestionnaireTree::new();
    let q = tree.add_item(None, Item::new("q", ItemType::String)).unwrap();
    let mut ctx = ValidationContext::default();

    let object = ValidationObject::from_item(q, tree.item(q).unwrap(), FieldKind::Type);
    assert_eq!(ctx.validate_field(&tree, &object, ValidationMode::Batch).unwrap(), None);
    assert!(ctx.status(q).is_none());
}

#[test]
fn test_display_missing_from_tree_is_a_fault() {
    let mut tree = QuestionnaireTree::new();
    let display = tree.add_item(None, Item::new("c", ItemType::Display)).unwrap();
    let object = ValidationObject::new(
        display,
        Some("c".into()),
        FieldValue::Type(Some(ItemType::Display)),
    );
    tree.remove_item(display).unwrap();

    let mut ctx = ValidationContext::default();
    let err = ctx
        .validate_field(&tree, &object, ValidationMode::Edit)
        .unwrap_err();
    assert!(matches!(err, ValidationFault::NodeNotFound(id) if id == display));
}

#[test]
fn test_dangling_question() {
    let (tree, dependent) = tree_with_conditions(vec![EnableWhen::new("missing", "=")]);
    let mut ctx = ValidationContext::default();

    let errors = ctx.validate_enable_when(&tree, dependent).unwrap().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::InvalidQuestion);
    assert_eq!(errors[0].path, "#enableWhen.0.question");
    assert_eq!(errors[0].message, "Question not found for the linkId 'missing'.");
    assert!(ctx.has_error(dependent, false));
}

#[test]
fn test_empty_answer_required() {
    let (tree, dependent) = tree_with_conditions(vec![
        EnableWhen::new("q1", "=").with_answer("answerString", json!("")),
    ]);
    let mut ctx = ValidationContext::default();

    let errors = ctx.validate_enable_when(&tree, dependent).unwrap().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::EnablewhenAnswerRequired);
    assert_eq!(errors[0].path, "#enableWhen.0.answerString");
    assert_eq!(
        errors[0].params,
        ErrorParams::Condition {
            question: "q1".into(),
            operator: "=".into(),
            answer: "\"\"".into(),
        }
    );
}

#[test]
fn test_presence_operators_need_no_answer() {
    let (tree, dependent) = tree_with_conditions(vec![
        EnableWhen::new("q1", "exists"),
        EnableWhen::new("q2", "notexists"),
    ]);
    let mut ctx = ValidationContext::default();

    assert_eq!(ctx.validate_enable_when(&tree, dependent).unwrap(), None);
    assert!(!ctx.has_error(dependent, true));
}

#[test]
fn test_answer_field_follows_target_type() {
    let (tree, dependent) = tree_with_conditions(vec![
        // Zero is a real answer.
        EnableWhen::new("q2", ">").with_answer("answerInteger", json!(0)),
        // Stored under the wrong key for an integer target.
        EnableWhen::new("q2", "<").with_answer("answerString", json!("5")),
        // A coding whose properties are all empty is empty.
        EnableWhen::new("q3", "=").with_answer("answerCoding", json!({"code": "", "system": null})),
    ]);
    let mut ctx = ValidationContext::default();

    let errors = ctx.validate_enable_when(&tree, dependent).unwrap().unwrap();
    let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["#enableWhen.1.answerInteger", "#enableWhen.2.answerCoding"]);
    assert_eq!(
        errors[0].params,
        ErrorParams::Condition {
            question: "q2".into(),
            operator: "<".into(),
            answer: "null".into(),
        }
    );
}

#[test]
fn test_conditions_are_aggregated() {
    let (tree, dependent) = tree_with_conditions(vec![
        EnableWhen::new("missing", "="),
        EnableWhen::new("q1", "!="),
        EnableWhen::new("q1", "exists"),
    ]);
    let mut ctx = ValidationContext::default();

    let errors = ctx.validate_enable_when(&tree, dependent).unwrap().unwrap();
    let codes: Vec<ErrorCode> = errors.iter().map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![ErrorCode::InvalidQuestion, ErrorCode::EnablewhenAnswerRequired]
    );
    assert_eq!(
        ctx.status(dependent).unwrap().field_errors(FieldKind::EnableWhen).len(),
        2
    );
}

#[test]
fn test_incomplete_rows_are_skipped() {
    let mut blank_operator = EnableWhen::new("q1", "");
    blank_operator.operator = None;
    let (tree, dependent) = tree_with_conditions(vec![
        EnableWhen::new("   ", "="),
        blank_operator,
        EnableWhen::new("q1", ""),
    ]);
    let mut ctx = ValidationContext::default();

    assert_eq!(ctx.validate_enable_when(&tree, dependent).unwrap(), None);
}

#[test]
fn test_fixing_a_condition_clears_the_status() {
    let (mut tree, dependent) = tree_with_conditions(vec![EnableWhen::new("q1", "=")]);
    let mut ctx = ValidationContext::default();
    assert!(ctx.validate_enable_when(&tree, dependent).unwrap().is_some());

    tree.item_mut(dependent).unwrap().enable_when[0] =
        EnableWhen::new("q1", "=").with_answer("answerString", Value::from("yes"));
    assert_eq!(ctx.validate_enable_when(&tree, dependent).unwrap(), None);
    assert!(ctx.is_clean());
    assert_eq!(ctx.errors().count(), 0);
}

#[test]
fn test_validate_node_runs_every_field() {
    let mut tree = QuestionnaireTree::new();
    let display = tree
        .add_item(
            None,
            Item::new(" bad", ItemType::Display).with_enable_when(EnableWhen::new("nope", "exists")),
        )
        .unwrap();
    tree.add_item(Some(display), Item::new("child", ItemType::String))
        .unwrap();
    let mut ctx = ValidationContext::default();

    let errors = ctx
        .validate_node(&tree, display, ValidationMode::Edit)
        .unwrap();
    let codes: Vec<ErrorCode> = errors.iter().map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![ErrorCode::InvalidType, ErrorCode::InvalidQuestion, ErrorCode::Pattern]
    );
    assert_eq!(ctx.errors().count(), 3);
}

#[test]
fn test_untyped_target_is_not_a_question() {
    let untyped: Item = serde_json::from_value(json!({ "linkId": "note", "text": "No type" })).unwrap();
    assert_eq!(untyped.item_type, None);

    let mut tree = QuestionnaireTree::new();
    tree.add_item(None, untyped).unwrap();
    let dependent = tree
        .add_item(
            None,
            Item::new("q", ItemType::String).with_enable_when(EnableWhen::new("note", "=")),
        )
        .unwrap();
    let mut ctx = ValidationContext::default();

    let errors = ctx.validate_enable_when(&tree, dependent).unwrap().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::InvalidQuestion);
    assert_eq!(errors[0].path, "#enableWhen.0.question");
}
