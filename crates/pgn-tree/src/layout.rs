//! Depth-first layout of a move tree into display elements.
//!
//! This is the single walk behind both the move list the UI renders and the
//! PGN text produced by [`crate::writer`]. At every branch point the main
//! child's move is laid out first, then each alternative in its own
//! parenthesised variation, then the main line continues.

use serde::Serialize;

use crate::tree::{MoveTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    MoveNumber,
    Move,
    Comment,
    VariationStart,
    VariationEnd,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayElement {
    pub kind: ElementKind,
    pub text: String,
    /// Set for moves and comments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// Variation nesting depth; 0 on the main line.
    pub indent_level: usize,
    pub needs_new_line: bool,
    pub force_line_break_after: bool,
}

impl DisplayElement {
    fn new(
        kind: ElementKind,
        text: impl Into<String>,
        node_id: Option<NodeId>,
        indent_level: usize,
    ) -> Self {
        DisplayElement {
            kind,
            text: text.into(),
            node_id,
            indent_level,
            needs_new_line: false,
            force_line_break_after: false,
        }
    }
}

/// Pending work for the layout walk.
enum Frame {
    Node {
        id: NodeId,
        /// Absolute half-move count at this node.
        ply: u64,
        /// First move inside a variation (or of the whole game).
        first: bool,
        /// The move was already laid out at its branch point.
        skip_move: bool,
        indent: usize,
    },
    Open {
        indent: usize,
    },
    Close {
        indent: usize,
    },
}

/// Lay out the whole tree, ending with the result element.
pub fn layout(tree: &MoveTree) -> Vec<DisplayElement> {
    let mut elements = Vec::new();
    let root_id = tree.root_id();

    let mut stack = vec![Frame::Node {
        id: root_id,
        ply: tree.start_ply(),
        first: true,
        skip_move: false,
        indent: 0,
    }];

    while let Some(frame) = stack.pop() {
        let (id, ply, first, skip_move, indent) = match frame {
            Frame::Open { indent } => {
                let mut open = DisplayElement::new(ElementKind::VariationStart, "(", None, indent);
                open.needs_new_line = true;
                elements.push(open);
                continue;
            }
            Frame::Close { indent } => {
                let mut close = DisplayElement::new(ElementKind::VariationEnd, ")", None, indent);
                close.force_line_break_after = true;
                elements.push(close);
                continue;
            }
            Frame::Node {
                id,
                ply,
                first,
                skip_move,
                indent,
            } => (id, ply, first, skip_move, indent),
        };

        let Some(node) = tree.node(id) else {
            continue;
        };

        if id == root_id {
            push_comment(&mut elements, tree, id, indent);
        } else if !skip_move {
            push_move(&mut elements, tree, id, ply, first, indent);
        }

        // The root's children open the game, so a black first move gets "N...".
        let child_first = id == root_id;

        match node.children.as_slice() {
            [] => {}
            [only] => stack.push(Frame::Node {
                id: *only,
                ply: ply + 1,
                first: child_first,
                skip_move: false,
                indent,
            }),
            children => {
                let Some(main) = tree.main_child(id) else {
                    continue;
                };
                push_move(&mut elements, tree, main, ply + 1, child_first, indent);

                stack.push(Frame::Node {
                    id: main,
                    ply: ply + 1,
                    first: false,
                    skip_move: true,
                    indent,
                });
                for &alt in children.iter().rev().filter(|&&c| c != main) {
                    stack.push(Frame::Close { indent: indent + 1 });
                    stack.push(Frame::Node {
                        id: alt,
                        ply: ply + 1,
                        first: true,
                        skip_move: false,
                        indent: indent + 1,
                    });
                    stack.push(Frame::Open { indent: indent + 1 });
                }
            }
        }
    }

    let result = tree.result().map(|r| r.as_str()).unwrap_or("*");
    elements.push(DisplayElement::new(ElementKind::Result, result, None, 0));
    elements
}

/// Lay out one move with its number and comment.
///
/// White moves always carry `N.`; black moves carry `N...` only when they
/// open a variation.
fn push_move(
    elements: &mut Vec<DisplayElement>,
    tree: &MoveTree,
    id: NodeId,
    ply: u64,
    first: bool,
    indent: usize,
) {
    let Some(node) = tree.node(id) else {
        return;
    };
    if node.mv.is_none() {
        return;
    }

    let number = ply.div_ceil(2);
    let is_white = ply % 2 == 1;
    let label = if is_white {
        Some(format!("{number}."))
    } else if first {
        Some(format!("{number}..."))
    } else {
        None
    };
    if let Some(label) = label {
        elements.push(DisplayElement::new(ElementKind::MoveNumber, label, None, indent));
    }
    elements.push(DisplayElement::new(
        ElementKind::Move,
        node.san.clone(),
        Some(id),
        indent,
    ));
    push_comment(elements, tree, id, indent);
}

fn push_comment(elements: &mut Vec<DisplayElement>, tree: &MoveTree, id: NodeId, indent: usize) {
    if let Some(comment) = tree.node(id).and_then(|n| n.comment.as_deref()) {
        if !comment.is_empty() {
            elements.push(DisplayElement::new(ElementKind::Comment, comment, Some(id), indent));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_tree;
    use crate::oracle::ShakmatyOracle;

    fn texts(elements: &[DisplayElement]) -> Vec<&str> {
        elements.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_layout_main_line() {
        let tree = build_tree("1. e4 e5 2. Nf3", &ShakmatyOracle);
        let elements = layout(&tree);
        assert_eq!(texts(&elements), vec!["1.", "e4", "e5", "2.", "Nf3", "*"]);
        assert_eq!(elements[1].kind, ElementKind::Move);
        assert_eq!(elements[1].node_id, Some(tree.main_line_ids()[1]));
    }

    #[test]
    fn test_layout_variation_indent_and_breaks() {
        let tree = build_tree("1. e4 e5 (1... c5 {Sicilian}) 2. Nf3", &ShakmatyOracle);
        let elements = layout(&tree);
        assert_eq!(
            texts(&elements),
            vec!["1.", "e4", "e5", "(", "1...", "c5", "Sicilian", ")", "2.", "Nf3", "*"]
        );
        let open = &elements[3];
        assert_eq!(open.kind, ElementKind::VariationStart);
        assert!(open.needs_new_line);
        assert_eq!(open.indent_level, 1);
        assert_eq!(elements[5].indent_level, 1);
        assert!(elements[7].force_line_break_after);
        assert_eq!(elements[8].indent_level, 0);
    }

    #[test]
    fn test_layout_black_to_move_start() {
        let tree = crate::builder::TreeBuilder::from_fen(
            &ShakmatyOracle,
            "4k3/8/8/8/8/8/4P3/4K3 b - - 0 30",
        )
        .map(|mut b| {
            b.feed_all(crate::token::tokenize("Kd7 e4"));
            b.finish()
        })
        .unwrap();
        assert_eq!(texts(&layout(&tree)), vec!["30...", "Kd7", "31.", "e4", "*"]);
    }

    #[test]
    fn test_layout_stored_result() {
        let tree = build_tree("1. e4 1-0", &ShakmatyOracle);
        assert_eq!(layout(&tree).last().unwrap().text, "1-0");
    }
}
