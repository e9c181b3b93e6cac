#![allow(dead_code)]

use std::collections::BTreeSet;

use pgn_tree::{build_tree, play_move, MoveTree, NodeId, ShakmatyOracle};

/// Build a tree from movetext with the standard oracle.
pub fn parse(movetext: &str) -> MoveTree {
    build_tree(movetext, &ShakmatyOracle)
}

/// SAN of every move-bearing node in `ids`.
pub fn sans(tree: &MoveTree, ids: &[NodeId]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| tree.node(*id))
        .filter(|node| node.mv.is_some())
        .map(|node| node.san.clone())
        .collect()
}

pub fn main_line(tree: &MoveTree) -> Vec<String> {
    sans(tree, tree.main_line_ids())
}

/// Every root-to-leaf SAN sequence.
pub fn leaf_lines(tree: &MoveTree) -> BTreeSet<Vec<String>> {
    tree.nodes()
        .values()
        .filter(|node| node.is_leaf() && node.id != tree.root_id())
        .map(|leaf| sans(tree, &tree.path_to_node(leaf.id).unwrap()))
        .collect()
}

/// First node, in creation order, whose SAN is `san`.
pub fn node_by_san(tree: &MoveTree, san: &str) -> NodeId {
    tree.nodes()
        .values()
        .find(|node| node.san == san)
        .map(|node| node.id)
        .unwrap_or_else(|| panic!("no node with SAN {}", san))
}

/// Play each move from the current node.
pub fn play_all(tree: &mut MoveTree, moves: &[&str]) -> Vec<NodeId> {
    moves
        .iter()
        .map(|mv| play_move(tree, &ShakmatyOracle, mv).unwrap_or_else(|e| panic!("{}: {}", mv, e)))
        .collect()
}

pub const SCENARIO_A: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 (3. Bc4 Be7 4. d3) 3... a6 4. Ba4 Nf6 5. O-O Be7 (5... b5 6. Bb3 Bb7) 6. Re1 *";
