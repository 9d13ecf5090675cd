//! Tests for the outline model
//!
//! Paths, moves that re-type what they move, the explicit add gate, rename and
//! delete semantics, duplicate id regeneration.

use rstest::rstest;

use coursetree::domain::{
    DomainError, EditorVariant, LessonDetails, LessonType, NodeType, MAX_DEPTH, Outline, Placement, TreeNode, TreePath,
};
use coursetree::util::testing::{init_test_setup, node, sample_curriculum};

fn p(raw: &str) -> TreePath {
    raw.parse().unwrap()
}

fn ids(outline: &Outline, parent: &str) -> Vec<String> {
    let count = outline.child_count(&p(parent)).unwrap();
    (0..count)
        .map(|i| outline.get(&p(parent).child(i)).unwrap().id.clone())
        .collect()
}

/// Every node carries the kind its depth implies.
fn assert_depth_typed(outline: &Outline) {
    for (path, depth, n) in outline.walk() {
        assert_eq!(
            n.node_type,
            outline.variant().type_for_depth(depth),
            "{} at {} has the wrong kind",
            n.id,
            path
        );
    }
}

/// S1[U1[M1,M2], U2[M3]], S2[U3]
fn structure_scenario() -> Outline {
    Outline::from_nodes(
        EditorVariant::Structure,
        vec![
            node("s1", NodeType::Section).with_children(vec![
                node("u1", NodeType::Unit).with_children(vec![
                    node("m1", NodeType::Module),
                    node("m2", NodeType::Module),
                ]),
                node("u2", NodeType::Unit).with_children(vec![node("m3", NodeType::Module)]),
            ]),
            node("s2", NodeType::Section).with_children(vec![node("u3", NodeType::Unit)]),
        ],
    )
    .unwrap()
}

// ============================================================
// concrete scenarios
// ============================================================

#[test]
fn given_structure_outline_when_unit_moved_under_other_section_then_appended_as_unit() {
    init_test_setup();
    // Arrange
    let mut outline = structure_scenario();

    // Act
    let moved = outline.move_as_child(&p("1.0"), &p("0"));

    // Assert
    assert_eq!(moved, Some(p("0.2")));
    assert_eq!(ids(&outline, "0"), vec!["u1", "u2", "u3"]);
    assert_eq!(outline.get(&p("0.2")).unwrap().node_type, NodeType::Unit);
    assert_eq!(outline.child_count(&p("1")), Some(0));
}

#[test]
fn given_curriculum_section_when_moved_under_unit_then_subtree_coerced_to_topic_and_lessons() {
    init_test_setup();
    // Arrange: s2 gets a unit with a topic so the coercion is visible two levels down
    let mut outline = Outline::from_nodes(
        EditorVariant::Curriculum,
        vec![
            node("s1", NodeType::Section)
                .with_children(vec![node("u1", NodeType::Unit)]),
            node("s2", NodeType::Section).with_children(vec![node("u2", NodeType::Unit)
                .with_children(vec![node("t2", NodeType::Topic)])]),
        ],
    )
    .unwrap();

    // Act
    let moved = outline.move_as_child(&p("1"), &p("0.0")).unwrap();

    // Assert
    assert_eq!(moved, p("0.0.0"));
    assert_eq!(outline.get_by_id("s2").unwrap().node_type, NodeType::Topic);
    assert_eq!(outline.get_by_id("u2").unwrap().node_type, NodeType::Lesson);
    // deeper than the ladder clamps to the last rung
    assert_eq!(outline.get_by_id("t2").unwrap().node_type, NodeType::Lesson);
    assert_depth_typed(&outline);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
fn given_blank_title_when_rename_then_title_unchanged(#[case] blank: &str) {
    // Arrange
    let mut outline = sample_curriculum();

    // Act
    let renamed = outline.rename(&p("0.0"), blank);

    // Assert
    assert!(!renamed);
    assert_eq!(outline.get(&p("0.0")).unwrap().title, "U1");
}

#[test]
fn given_padded_title_when_rename_then_trimmed_title_stored() {
    let mut outline = sample_curriculum();
    assert!(outline.rename(&p("0.0"), "  Algebra  "));
    assert_eq!(outline.get(&p("0.0")).unwrap().title, "Algebra");
}

// ============================================================
// depth-type invariant
// ============================================================

#[test]
fn given_mixed_operations_when_applied_then_every_node_is_depth_typed() {
    init_test_setup();
    // Arrange
    let mut outline = sample_curriculum();

    // Act
    outline.move_as_child(&p("1"), &p("0.0.0")).unwrap();
    outline.move_after(&p("0.0.1"), &p("0")).unwrap();
    outline.move_before(&p("0.0.0.0"), &p("0.1")).unwrap();
    outline.duplicate(&p("0.0")).unwrap();
    assert!(outline.insert_at_path(&p("0"), 0, node("x", NodeType::Lesson)));
    outline.remove_at_path(&p("1")).unwrap();

    // Assert
    assert_depth_typed(&outline);
}

#[test]
fn given_stored_nodes_with_wrong_types_when_loaded_then_restamped() {
    let outline = Outline::from_nodes(
        EditorVariant::Structure,
        vec![node("a", NodeType::Module).with_children(vec![node("b", NodeType::Section)
            .with_children(vec![node("c", NodeType::Lesson).with_children(vec![node(
                "d",
                NodeType::Unit,
            )])])])],
    )
    .unwrap();

    assert_depth_typed(&outline);
    assert_eq!(outline.get_by_id("d").unwrap().node_type, NodeType::Module);
}

// ============================================================
// moves and index arithmetic
// ============================================================

#[test]
fn given_leaf_when_moved_away_and_back_then_outline_restored_except_type() {
    // Arrange
    let mut outline = sample_curriculum();
    let before = outline.to_nodes();
    let leaf = outline.subtree(&p("0.0.1")).unwrap();

    // Act: t2 goes under s2, then back to u1 at index 1
    let away = outline.move_as_child(&p("0.0.1"), &p("1")).unwrap();
    assert_eq!(outline.get(&away).unwrap().node_type, NodeType::Unit);
    let back = outline.move_after(&away, &p("0.0.0")).unwrap();

    // Assert
    assert_eq!(back, p("0.0.1"));
    let restored = outline.subtree(&back).unwrap();
    assert_eq!(restored.id, leaf.id);
    assert_eq!(restored.title, leaf.title);
    assert_eq!(restored.children, leaf.children);
    assert_eq!(outline.to_nodes(), before);
}

#[test]
fn given_three_siblings_when_first_moved_after_last_and_back_then_order_restored() {
    // Arrange
    let mut outline = Outline::from_nodes(
        EditorVariant::Curriculum,
        vec![node("a", NodeType::Section), node("b", NodeType::Section), node("c", NodeType::Section)],
    )
    .unwrap();

    // Act
    let a = outline.move_after(&p("0"), &p("2")).unwrap();
    assert_eq!(ids(&outline, "/"), vec!["b", "c", "a"]);
    let b = outline.locate("b").unwrap();
    outline.move_before(&a, &b).unwrap();

    // Assert
    assert_eq!(ids(&outline, "/"), vec!["a", "b", "c"]);
}

#[test]
fn given_earlier_sibling_when_moved_after_later_one_then_lands_right_after_it() {
    let mut outline = Outline::from_nodes(
        EditorVariant::Curriculum,
        vec![
            node("a", NodeType::Section),
            node("b", NodeType::Section),
            node("c", NodeType::Section),
            node("d", NodeType::Section),
        ],
    )
    .unwrap();

    let moved = outline.move_after(&p("0"), &p("2"));

    assert_eq!(moved, Some(p("2")));
    assert_eq!(ids(&outline, "/"), vec!["b", "c", "a", "d"]);
}

#[test]
fn given_earlier_sibling_of_drop_ancestor_when_moved_as_child_then_lands_under_shifted_target() {
    // Arrange: a, b[x], c
    let mut outline = Outline::from_nodes(
        EditorVariant::Curriculum,
        vec![
            node("a", NodeType::Section),
            node("b", NodeType::Section).with_children(vec![node("x", NodeType::Unit)]),
            node("c", NodeType::Section),
        ],
    )
    .unwrap();

    // Act
    let moved = outline.move_as_child(&p("0"), &p("1.0"));

    // Assert
    assert_eq!(moved, Some(p("0.0.0")));
    assert_eq!(ids(&outline, "/"), vec!["b", "c"]);
    assert_eq!(ids(&outline, "0.0"), vec!["a"]);
    assert_eq!(outline.get_by_id("a").unwrap().node_type, NodeType::Topic);
    assert_depth_typed(&outline);
}

#[test]
fn given_earlier_sibling_when_moved_before_later_one_then_lands_right_before_it() {
    let mut outline = Outline::from_nodes(
        EditorVariant::Curriculum,
        vec![node("a", NodeType::Section), node("b", NodeType::Section), node("c", NodeType::Section)],
    )
    .unwrap();

    let moved = outline.move_before(&p("0"), &p("2"));

    assert_eq!(moved, Some(p("1")));
    assert_eq!(ids(&outline, "/"), vec!["b", "a", "c"]);
    assert_eq!(outline.get_by_id("a").unwrap().node_type, NodeType::Section);
}

#[test]
fn given_node_when_moved_into_own_subtree_then_refused_and_unchanged() {
    // Arrange
    let mut outline = sample_curriculum();
    let before = outline.to_nodes();

    // Act & Assert
    assert_eq!(outline.move_as_child(&p("0"), &p("0")), None);
    assert_eq!(outline.move_as_child(&p("0"), &p("0.0.0")), None);
    assert_eq!(outline.move_before(&p("0.0"), &p("0.0.1")), None);
    assert_eq!(outline.to_nodes(), before);
}

#[test]
fn given_stale_paths_when_operating_then_silent_no_op() {
    let mut outline = sample_curriculum();
    let before = outline.to_nodes();

    assert!(outline.node_at_path(&p("9")).is_none());
    assert!(outline.remove_at_path(&p("0.7")).is_none());
    assert!(!outline.insert_at_path(&p("5.5"), 0, node("x", NodeType::Unit)));
    assert!(!outline.insert_at_path(&p("0"), 9, node("x", NodeType::Unit)));
    assert_eq!(outline.move_as_child(&p("0.0.0"), &p("4")), None);
    assert!(!outline.rename(&p("3.3"), "x"));
    assert_eq!(outline.duplicate(&p("8")), None);
    assert_eq!(outline.to_nodes(), before);
}

#[test]
fn given_node_at_path_when_resolved_then_reports_siblings_and_index() {
    let outline = sample_curriculum();

    let located = outline.node_at_path(&p("0.1")).unwrap();

    assert_eq!(located.node.id, "u2");
    assert_eq!(located.siblings, vec!["u1", "u2"]);
    assert_eq!(located.index, 1);
}

#[test]
fn given_structure_outline_when_make_root_section_then_appended_as_section() {
    let mut outline = structure_scenario();

    let moved = outline.make_root_section(&p("0.0.1"));

    assert_eq!(moved, Some(p("2")));
    assert_eq!(outline.get_by_id("m2").unwrap().node_type, NodeType::Section);
    assert_eq!(ids(&outline, "0.0"), vec!["m1"]);
}

#[test]
fn given_curriculum_outline_when_make_root_section_then_refused() {
    let mut outline = sample_curriculum();
    assert_eq!(outline.make_root_section(&p("0.0")), None);
}

// ============================================================
// explicit add gate
// ============================================================

#[rstest]
#[case(EditorVariant::Structure, "/", NodeType::Section, true)]
#[case(EditorVariant::Structure, "0", NodeType::Unit, true)]
#[case(EditorVariant::Structure, "0", NodeType::Module, false)]
#[case(EditorVariant::Structure, "0.0", NodeType::Module, true)]
#[case(EditorVariant::Structure, "0.0.0", NodeType::Module, false)]
#[case(EditorVariant::Curriculum, "0.0", NodeType::Topic, true)]
#[case(EditorVariant::Curriculum, "0.0", NodeType::Module, false)]
#[case(EditorVariant::Curriculum, "0.0.0", NodeType::Lesson, true)]
#[case(EditorVariant::Curriculum, "0.0.0.0", NodeType::Lesson, false)]
fn given_parent_when_add_child_then_only_next_rung_accepted(
    #[case] variant: EditorVariant,
    #[case] parent: &str,
    #[case] kind: NodeType,
    #[case] accepted: bool,
) {
    // Arrange
    let mut outline = Outline::from_nodes(
        variant,
        vec![node("s", NodeType::Section).with_children(vec![node("u", NodeType::Unit)
            .with_children(vec![node("t", NodeType::Topic)
                .with_children(vec![node("l", NodeType::Lesson)])])])],
    )
    .unwrap();
    let before = outline.len();

    // Act
    let added = outline.add_child(&p(parent), kind, "New");

    // Assert
    assert_eq!(added.is_some(), accepted);
    assert_eq!(outline.len(), before + usize::from(accepted));
    if let Some(path) = added {
        assert_eq!(outline.get(&path).unwrap().node_type, kind);
    }
}

#[test]
fn given_blank_title_when_add_child_then_default_title_used() {
    let mut outline = sample_curriculum();
    let path = outline.add_child(&p("0.0.1"), NodeType::Lesson, " ").unwrap();
    assert_eq!(outline.get(&path).unwrap().title, "New Lesson");
}

#[test]
fn given_target_when_add_relative_after_then_sibling_of_same_kind() {
    let mut outline = sample_curriculum();

    let path = outline
        .add_relative(&p("0.0.0"), Placement::After, "Vectors")
        .unwrap();

    assert_eq!(path, p("0.0.1"));
    assert_eq!(outline.get(&path).unwrap().node_type, NodeType::Topic);
    assert_eq!(outline.get(&p("0.0.2")).unwrap().id, "t2");
}

// ============================================================
// delete, duplicate, lessons
// ============================================================

#[test]
fn given_declined_confirmation_when_delete_then_outline_untouched() {
    let mut outline = sample_curriculum();
    let before = outline.to_nodes();
    let mut asked = None;

    let removed = outline.delete(&p("0.0"), |n| {
        asked = Some(n.title.clone());
        false
    });

    assert!(removed.is_none());
    assert_eq!(asked.as_deref(), Some("U1"));
    assert_eq!(outline.to_nodes(), before);
}

#[test]
fn given_confirmed_delete_then_exactly_the_subtree_removed() {
    let mut outline = sample_curriculum();

    let removed = outline.delete(&p("0.0"), |_| true).unwrap();

    assert_eq!(removed.id, "u1");
    assert_eq!(removed.subtree_len(), 4);
    assert_eq!(outline.len(), 3);
    assert_eq!(ids(&outline, "0"), vec!["u2"]);
    assert!(outline.get_by_id("l1").is_none());
}

#[test]
fn given_subtree_when_duplicated_then_copy_follows_with_fresh_ids_everywhere() {
    // Arrange
    let mut outline = sample_curriculum();
    let original = outline.subtree(&p("0.0")).unwrap();

    // Act
    let copy_path = outline.duplicate(&p("0.0")).unwrap();

    // Assert
    assert_eq!(copy_path, p("0.1"));
    assert_eq!(ids(&outline, "0")[2], "u2");
    let copy = outline.subtree(&copy_path).unwrap();
    assert_eq!(copy.title, original.title);
    assert_eq!(copy.subtree_len(), original.subtree_len());
    assert!(copy.id.starts_with("u1-"));

    fn all_ids(n: &TreeNode, out: &mut Vec<String>) {
        out.push(n.id.clone());
        n.children.iter().for_each(|c| all_ids(c, out));
    }
    let mut seen = Vec::new();
    for root in outline.to_nodes() {
        all_ids(&root, &mut seen);
    }
    let unique: std::collections::HashSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), seen.len(), "duplicate ids in {:?}", seen);
}

#[test]
fn given_lesson_when_details_updated_then_stored_and_kept_across_moves() {
    // Arrange
    let mut outline = sample_curriculum();
    let details = LessonDetails {
        duration: Some(45),
        lesson_type: Some(LessonType::Quiz),
        ..LessonDetails::default()
    };

    // Act
    assert!(outline.update_lesson(&p("0.0.0.0"), details.clone()));
    let moved = outline.move_as_child(&p("0.0.0.0"), &p("0.0.1")).unwrap();

    // Assert
    assert_eq!(outline.get(&moved).unwrap().lesson, details);
    assert_eq!(outline.stats().total_minutes, 45);
}

#[test]
fn given_non_lesson_when_details_updated_then_refused() {
    let mut outline = sample_curriculum();
    let details = LessonDetails {
        duration: Some(10),
        ..LessonDetails::default()
    };
    assert!(!outline.update_lesson(&p("0.0"), details));
}

#[test]
fn given_outline_when_merging_colliding_ids_then_appended_with_new_ids() {
    let mut outline = sample_curriculum();

    let added = outline
        .merge_from(vec![node("s1", NodeType::Unit).with_children(vec![node("x", NodeType::Lesson)])])
        .unwrap();

    assert_eq!(added, 1);
    let merged = outline.get(&p("2")).unwrap();
    assert_ne!(merged.id, "s1");
    assert_eq!(merged.node_type, NodeType::Section);
    assert_eq!(outline.get_by_id("x").unwrap().node_type, NodeType::Unit);
}

// ============================================================
// depth limit
// ============================================================

/// A single chain of `levels` nodes below a section, built without recursion.
fn deep_chain(levels: usize) -> TreeNode {
    let mut chain = node("leaf", NodeType::Lesson);
    for i in 0..levels {
        chain = node(&format!("n{}", i), NodeType::Lesson).with_children(vec![chain]);
    }
    chain
}

/// Deep chains still drop recursively, so they get a roomy stack.
fn with_big_stack<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn given_very_deep_subtree_when_inserted_or_loaded_then_refused_with_depth_limit() {
    with_big_stack(|| {
        // Arrange
        let mut outline = sample_curriculum();
        let before = outline.to_nodes();

        // Act & Assert
        assert!(!outline.insert_at_path(&p("/"), 0, deep_chain(10_000)));
        assert_eq!(outline.to_nodes(), before);
        assert_eq!(
            Outline::from_nodes(EditorVariant::Curriculum, vec![deep_chain(10_000)]).err(),
            Some(DomainError::DepthLimitExceeded { limit: MAX_DEPTH })
        );
        assert!(deep_chain(10_000).exceeds_depth(MAX_DEPTH));
        assert_eq!(deep_chain(10_000).subtree_len(), 10_001);
    });
}

#[test]
fn given_subtree_exactly_at_depth_limit_when_loaded_then_accepted() {
    let outline = Outline::from_nodes(EditorVariant::Curriculum, vec![deep_chain(MAX_DEPTH)]);

    assert!(outline.is_ok());
    assert!(!deep_chain(MAX_DEPTH).exceeds_depth(MAX_DEPTH));
}
