//! Integration tests: building, editing and exporting move trees through the
//! public API.

mod common;

use common::{leaf_lines, main_line, node_by_san, parse, play_all, sans, SCENARIO_A};
use pgn_tree::{
    extract_arrows, extract_clock, merge_annotations, strip_annotations, to_pgn, Arrow,
    GameResult, MoveTree, NodeId, PositionOracle, ShakmatyOracle, TreeBuilder, TreeError,
};

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_ruy_lopez_with_two_variations() {
    let tree = parse(SCENARIO_A);

    assert_eq!(
        main_line(&tree),
        vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6", "O-O", "Be7", "Re1"]
    );

    let branches = tree.all_branches();
    assert_eq!(branches.len(), 3);
    let side: Vec<_> = branches.iter().filter(|b| !b.is_main_line).collect();
    assert_eq!(side.len(), 2);

    let main_ids = tree.main_line_ids();
    let bc4 = node_by_san(&tree, "Bc4");
    let b5 = node_by_san(&tree, "b5");
    // Before White's 3rd move, and before Black's 5th.
    assert_eq!(tree.node(bc4).unwrap().parent, Some(main_ids[4]));
    assert_eq!(tree.node(b5).unwrap().parent, Some(main_ids[9]));

    assert_eq!(
        sans(&tree, &side[0].node_ids),
        vec!["e4", "e5", "Nf3", "Nc6", "Bc4", "Be7", "d3"]
    );
    assert_eq!(side[0].move_count, 7);
    assert_eq!(
        sans(&tree, &side[1].node_ids)[9..],
        ["b5", "Bb3", "Bb7"]
    );
    assert_eq!(tree.result(), Some(GameResult::Ongoing));
}

#[test]
fn test_arrow_comment() {
    let comment = "[%draw arrow,e2,e4,green] Good developing move";
    assert_eq!(
        extract_arrows(comment),
        vec![Arrow {
            from: "e2".to_string(),
            to: "e4".to_string(),
            color: "green".to_string(),
        }]
    );
    assert_eq!(strip_annotations(comment), "Good developing move");
}

#[test]
fn test_delete_variation_keeps_the_rest() {
    let mut tree = parse(SCENARIO_A);
    let before = tree.len();
    let main_before = tree.main_line_ids().to_vec();

    let removed = tree.delete_branch(node_by_san(&tree, "Bc4")).unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(tree.len(), before - 3);
    assert_eq!(tree.main_line_ids(), main_before.as_slice());

    let branches = tree.all_branches();
    assert_eq!(branches.len(), 2);
    assert!(sans(&tree, &branches[1].node_ids).ends_with(&[
        "b5".to_string(),
        "Bb3".to_string(),
        "Bb7".to_string()
    ]));
}

#[test]
fn test_illegal_move_truncates_line() {
    let mut builder = TreeBuilder::new(&ShakmatyOracle);
    builder.feed_all(pgn_tree::tokenize("1. e4 e5 2. Nf3 Nc6 3. Bb9 a6 4. Ba4 Nf6 *"));
    let (tree, skipped) = builder.into_parts();

    assert_eq!(main_line(&tree), vec!["e4", "e5", "Nf3", "Nc6"]);
    assert_eq!(skipped.len(), 4);
    assert_eq!(skipped[0].notation, "Bb9");
    assert_eq!(skipped[0].parent, tree.main_line_ids()[4]);
    assert_eq!(tree.result(), Some(GameResult::Ongoing));
}

// ---------------------------------------------------------------------------
// Store contracts
// ---------------------------------------------------------------------------

#[test]
fn test_add_move_appends_child_and_moves_cursor() {
    let oracle = ShakmatyOracle;
    let mut tree = parse("1. e4");
    let root = tree.root_id();

    let (mv, next) = oracle.apply_move(&oracle.initial_position(), "d4").unwrap();
    let id = tree.add_move(mv, oracle.position_to_fen(&next), root).unwrap();

    assert_eq!(tree.root().children.last(), Some(&id));
    assert_eq!(tree.current_node_id(), id);
    assert_eq!(main_line(&tree), vec!["e4"]);
}

#[test]
fn test_failed_operations_leave_tree_untouched() {
    let oracle = ShakmatyOracle;
    let mut tree = parse(SCENARIO_A);
    let snapshot = tree.clone();
    let missing = NodeId::new(9999);

    let (mv, next) = oracle.apply_move(&oracle.initial_position(), "d4").unwrap();
    assert_eq!(
        tree.add_move(mv, oracle.position_to_fen(&next), missing),
        Err(TreeError::ParentNotFound(missing))
    );
    assert_eq!(tree.go_to_node(missing), Err(TreeError::NodeNotFound(missing)));
    assert_eq!(tree.delete_branch(tree.root_id()), Err(TreeError::CannotDeleteRoot));
    assert_eq!(tree, snapshot);
}

#[test]
fn test_delete_removes_exactly_the_subtree() {
    let mut tree = parse(SCENARIO_A);
    let target = node_by_san(&tree, "a6");
    let mut expected = vec![target];
    let mut i = 0;
    while i < expected.len() {
        expected.extend(tree.node(expected[i]).unwrap().children.iter().copied());
        i += 1;
    }
    let untouched: Vec<NodeId> = tree
        .nodes()
        .keys()
        .copied()
        .filter(|id| !expected.contains(id))
        .collect();

    let mut removed = tree.delete_branch(target).unwrap();
    removed.sort();
    expected.sort();
    assert_eq!(removed, expected);
    assert_eq!(tree.nodes().keys().copied().collect::<Vec<_>>(), untouched);
    assert_eq!(main_line(&tree), vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
}

#[test]
fn test_promote_to_main_line() {
    let mut tree = parse(SCENARIO_A);
    let bb7 = node_by_san(&tree, "Bb7");
    tree.promote_to_main_line(bb7).unwrap();

    let mut expected = vec![tree.root_id()];
    expected.extend(tree.path_to_node(bb7).unwrap());
    assert_eq!(tree.main_line_ids(), expected.as_slice());

    let main: Vec<_> = tree.all_branches().into_iter().filter(|b| b.is_main_line).collect();
    assert_eq!(main.len(), 1);
    assert_eq!(main[0].node_ids, tree.main_line_ids());

    assert!(to_pgn(&tree).contains("5. O-O b5 (5... Be7 6. Re1) 6. Bb3 Bb7 *"));
    // Export still describes the same set of lines.
    assert_eq!(leaf_lines(&parse(&to_pgn(&tree))), leaf_lines(&tree));
}

#[test]
fn test_branch_enumeration_has_one_main_line() {
    for movetext in [SCENARIO_A, "", "1. d4 (1. e4) (1. c4) 1... Nf6"] {
        let tree = parse(movetext);
        let main: Vec<_> = tree.all_branches().into_iter().filter(|b| b.is_main_line).collect();
        assert_eq!(main.len(), 1, "movetext: {movetext}");
        assert_eq!(main[0].node_ids, tree.main_line_ids());
    }
}

// ---------------------------------------------------------------------------
// Navigation and editing
// ---------------------------------------------------------------------------

#[test]
fn test_undo_redo_navigation() {
    let mut tree = parse("1. e4 e5 (1... c5) 2. Nf3");
    tree.go_to_node(tree.root_id()).unwrap();
    assert!(!tree.can_go_back());
    assert!(!tree.go_back());

    assert!(tree.go_forward());
    assert_eq!(tree.current_node().san, "e4");
    let alternatives: Vec<&str> = tree.alternatives().iter().map(|a| a.san).collect();
    assert_eq!(alternatives, vec!["e5", "c5"]);

    assert!(tree.go_forward());
    assert!(tree.go_forward());
    assert_eq!(tree.current_node().san, "Nf3");
    assert!(!tree.can_go_forward());
    assert!(!tree.go_forward());

    let played: Vec<&str> = tree.current_moves().iter().map(|m| m.uci.as_str()).collect();
    assert_eq!(played, vec!["e2e4", "e7e5", "g1f3"]);
}

#[test]
fn test_playing_moves_builds_variations() {
    let mut tree = MoveTree::default();
    play_all(&mut tree, &["e4", "e5", "Nf3"]);
    tree.go_back();
    play_all(&mut tree, &["Bc4", "Nc6"]);
    tree.go_to_node(tree.root_id()).unwrap();
    // Replaying an existing move only navigates.
    let ids = play_all(&mut tree, &["e2e4"]);
    assert_eq!(ids[0], tree.root().children[0]);

    assert_eq!(to_pgn(&tree), "1. e4 e5 2. Nf3 (2. Bc4 Nc6) *");
}

#[test]
fn test_comment_editing_keeps_directives() {
    let mut tree =
        parse("1. e4 {[%draw arrow,e2,e4,green] Good developing move [%clk 0:09:58]} e5");
    let e4 = node_by_san(&tree, "e4");
    let previous = tree.node(e4).unwrap().comment.clone().unwrap();

    tree.set_comment(e4, Some(merge_annotations("The king's pawn", &previous)))
        .unwrap();
    let comment = tree.node(e4).unwrap().comment.as_deref().unwrap();
    assert_eq!(strip_annotations(comment), "The king's pawn");
    assert_eq!(extract_arrows(comment), extract_arrows(&previous));
    assert_eq!(extract_clock(comment).as_deref(), Some("0:09:58"));

    tree.set_comment(e4, None).unwrap();
    assert_eq!(to_pgn(&tree), "1. e4 e5 *");
}

#[test]
fn test_tree_json_snapshot_round_trip() {
    let tree = parse(SCENARIO_A);
    let json = serde_json::to_string(&tree).unwrap();
    let restored: MoveTree = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, tree);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("mainLineIds").is_some());
    assert_eq!(value["nodes"]["1"]["move"]["san"], "e4");
}

#[test]
fn test_tree_json_snapshot_with_stale_next_id_is_rejected() {
    let tree = parse("1. e4 e5");
    let mut value = serde_json::to_value(&tree).unwrap();
    value["nextId"] = serde_json::json!(1);

    let err = serde_json::from_value::<MoveTree>(value).unwrap_err();
    assert!(err.to_string().contains("Invalid tree snapshot"));
}

#[test]
fn test_empty_tree_json_snapshot_is_rejected() {
    let json = r#"{"nodes":{},"rootId":0,"currentNodeId":0,"mainLineIds":[0],"nextId":1}"#;
    assert!(serde_json::from_str::<MoveTree>(json).is_err());
}
