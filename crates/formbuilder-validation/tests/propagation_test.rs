use form_tree::{Item, ItemType, NodeId, QuestionnaireTree};
use formbuilder_validation::{
    ErrorCode, ErrorParams, FieldKind, NodeStatusTable, TreeProvider, ValidationContext,
    ValidationError,
};

/// ```text
/// g1
/// ├── g2
/// │   ├── a
/// │   └── b
/// ├── g3
/// │   └── d
/// └── c
/// ```
struct Fixture {
    tree: QuestionnaireTree,
    g1: NodeId,
    g2: NodeId,
    g3: NodeId,
    a: NodeId,
    b: NodeId,
    c: NodeId,
    d: NodeId,
}

fn fixture() -> Fixture {
    let mut tree = QuestionnaireTree::new();
    let g1 = tree.add_item(None, Item::new("g1", ItemType::Group)).unwrap();
    let g2 = tree.add_item(Some(g1), Item::new("g2", ItemType::Group)).unwrap();
    let a = tree.add_item(Some(g2), Item::new("a", ItemType::String)).unwrap();
    let b = tree.add_item(Some(g2), Item::new("b", ItemType::String)).unwrap();
    let g3 = tree.add_item(Some(g1), Item::new("g3", ItemType::Group)).unwrap();
    let d = tree.add_item(Some(g3), Item::new("d", ItemType::String)).unwrap();
    let c = tree.add_item(Some(g1), Item::new("c", ItemType::String)).unwrap();
    Fixture {
        tree,
        g1,
        g2,
        g3,
        a,
        b,
        c,
        d,
    }
}

fn some_error(id: NodeId) -> Vec<ValidationError> {
    vec![ValidationError::new(
        ErrorCode::Required,
        "linkId",
        "Link Id is required.",
        ErrorParams::Field {
            link_id: None,
            node_id: id,
            field: "linkId".into(),
        },
    )]
}

fn set_error(table: &mut NodeStatusTable, tree: &QuestionnaireTree, id: NodeId) {
    table.update_validation_status(tree, id, None, FieldKind::LinkId, Some(&some_error(id)));
}

fn clear_error(table: &mut NodeStatusTable, tree: &QuestionnaireTree, id: NodeId) {
    table.update_validation_status(tree, id, None, FieldKind::LinkId, None);
}

fn descendants_have_error(table: &NodeStatusTable, tree: &QuestionnaireTree, id: NodeId) -> bool {
    tree.children(id)
        .iter()
        .any(|&child| table.has_error(child, false) || descendants_have_error(table, tree, child))
}

/// `child_has_error(N)` iff some descendant of `N` has an error.
fn assert_invariant(table: &NodeStatusTable, tree: &QuestionnaireTree) {
    for id in tree.validation_nodes() {
        let flagged = table.get(id).is_some_and(|s| s.child_has_error);
        assert_eq!(
            flagged,
            descendants_have_error(table, tree, id),
            "child_has_error of {:?}",
            tree.link_id(id)
        );
    }
}

fn snapshot(table: &NodeStatusTable, tree: &QuestionnaireTree) -> Vec<(bool, bool)> {
    tree.validation_nodes()
        .into_iter()
        .map(|id| {
            table
                .get(id)
                .map_or((false, false), |s| (s.has_error, s.child_has_error))
        })
        .collect()
}

#[test]
fn test_error_flags_every_ancestor() {
    let f = fixture();
    let mut table = NodeStatusTable::default();

    set_error(&mut table, &f.tree, f.a);
    assert!(table.has_error(f.g2, true));
    assert!(table.has_error(f.g1, true));
    assert!(!table.has_error(f.g1, false));
    assert!(!table.has_error(f.g3, true));
    assert_invariant(&table, &f.tree);
}

#[test]
fn test_sibling_keeps_parent_flagged() {
    let f = fixture();
    let mut table = NodeStatusTable::default();

    set_error(&mut table, &f.tree, f.a);
    set_error(&mut table, &f.tree, f.b);
    clear_error(&mut table, &f.tree, f.a);
    assert!(table.has_error(f.g2, true));
    assert!(table.has_error(f.g1, true));
    assert_invariant(&table, &f.tree);

    clear_error(&mut table, &f.tree, f.b);
    assert!(!table.has_error(f.g2, true));
    assert!(!table.has_error(f.g1, true));
    assert_invariant(&table, &f.tree);
}

#[test]
fn test_error_in_another_branch_keeps_root_flagged() {
    let f = fixture();
    let mut table = NodeStatusTable::default();

    // `d` sits two levels below g1, in a branch whose group has no error of its own.
    set_error(&mut table, &f.tree, f.a);
    set_error(&mut table, &f.tree, f.d);
    clear_error(&mut table, &f.tree, f.a);

    assert!(!table.has_error(f.g2, true));
    assert!(table.has_error(f.g3, true));
    assert!(table.has_error(f.g1, true));
    assert_invariant(&table, &f.tree);

    clear_error(&mut table, &f.tree, f.d);
    assert!(!table.has_error(f.g1, true));
    assert_invariant(&table, &f.tree);
}

#[test]
fn test_direct_child_and_grandchild() {
    let f = fixture();
    let mut table = NodeStatusTable::default();

    set_error(&mut table, &f.tree, f.a);
    set_error(&mut table, &f.tree, f.c);
    clear_error(&mut table, &f.tree, f.a);
    assert!(table.has_error(f.g1, true));
    assert_invariant(&table, &f.tree);

    clear_error(&mut table, &f.tree, f.c);
    assert!(!table.has_error(f.g1, true));
    assert_invariant(&table, &f.tree);
}

#[test]
fn test_group_with_own_error() {
    let f = fixture();
    let mut table = NodeStatusTable::default();

    set_error(&mut table, &f.tree, f.g2);
    set_error(&mut table, &f.tree, f.a);
    clear_error(&mut table, &f.tree, f.g2);

    // g2 lost its own error but still has one below it.
    assert!(!table.has_error(f.g2, false));
    assert!(table.has_error(f.g2, true));
    assert!(table.has_error(f.g1, true));
    assert_invariant(&table, &f.tree);
}

#[test]
fn test_walks_are_idempotent() {
    let f = fixture();
    let mut table = NodeStatusTable::default();
    set_error(&mut table, &f.tree, f.a);
    set_error(&mut table, &f.tree, f.d);

    let before = snapshot(&table, &f.tree);
    table.add_error_for_ancestor_nodes(&f.tree, f.a);
    table.add_error_for_ancestor_nodes(&f.tree, f.a);
    assert_eq!(snapshot(&table, &f.tree), before);

    clear_error(&mut table, &f.tree, f.a);
    let before = snapshot(&table, &f.tree);
    table.remove_error_from_ancestor_nodes(&f.tree, f.a);
    table.remove_error_from_ancestor_nodes(&f.tree, f.a);
    assert_eq!(snapshot(&table, &f.tree), before);
    assert_invariant(&table, &f.tree);
}

#[test]
fn test_removing_an_erroneous_subtree() {
    let mut f = fixture();
    let mut ctx = ValidationContext::default();
    ctx.seed_from_tree(&f.tree);
    assert_eq!(ctx.status_table().len(), 7);

    f.tree.item_mut(f.d).unwrap().link_id = Some("a".into());
    ctx.validate_link_id(&f.tree, f.a, None, "a");
    ctx.validate_link_id(&f.tree, f.d, Some("d"), "a");
    assert!(ctx.has_error(f.g3, true));
    assert!(ctx.has_error(f.g2, true));

    let removed = f.tree.remove_item(f.g3).unwrap();
    assert_eq!(removed, vec![f.g3, f.d]);
    ctx.forget_subtree(&f.tree, Some(f.g1), &removed);

    assert!(ctx.status(f.g3).is_none());
    assert!(ctx.status(f.d).is_none());
    assert!(!ctx.has_error(f.a, false));
    assert!(!ctx.has_error(f.g1, true));
    assert_invariant(ctx.status_table(), &f.tree);
}
