//! PGN movetext export.

use crate::layout::{layout, DisplayElement, ElementKind};
use crate::tree::MoveTree;

/// What to include when exporting movetext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub comments: bool,
    /// Terminate with the result token (`*` when the tree has none).
    pub result: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            comments: true,
            result: true,
        }
    }
}

/// Movetext for the whole tree, with comments and result.
pub fn to_pgn(tree: &MoveTree) -> String {
    to_pgn_with(tree, WriteOptions::default())
}

pub fn to_pgn_with(tree: &MoveTree, options: WriteOptions) -> String {
    render(&layout(tree), options)
}

/// Join display elements into PGN text. `(` sticks to the token after it
/// and `)` to the token before it.
pub fn render(elements: &[DisplayElement], options: WriteOptions) -> String {
    let mut out = String::new();
    let mut glue_next = true;

    for element in elements {
        let text = match element.kind {
            ElementKind::Comment => {
                if !options.comments {
                    continue;
                }
                let body = element.text.replace('}', "");
                let body = body.trim();
                if body.is_empty() {
                    continue;
                }
                format!("{{{body}}}")
            }
            ElementKind::Result if !options.result => continue,
            _ => element.text.clone(),
        };

        if !glue_next && element.kind != ElementKind::VariationEnd {
            out.push(' ');
        }
        out.push_str(&text);
        glue_next = element.kind == ElementKind::VariationStart;
    }

    out
}
