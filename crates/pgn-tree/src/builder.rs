//! Folds a token stream into a [`MoveTree`].
//!
//! Variation nesting is tracked with an explicit stack of saved cursors, so
//! arbitrarily deep `((((...))))` input costs heap, not native stack.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{OracleError, PlayError};
use crate::oracle::PositionOracle;
use crate::token::{tokenize, Token};
use crate::tree::{MoveTree, NodeId};

/// Where the next move will be attached, and the position there.
#[derive(Clone)]
struct Cursor<P> {
    node_id: NodeId,
    position: P,
}

/// A move token the oracle refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMove {
    pub notation: String,
    /// Node the move would have been attached to.
    pub parent: NodeId,
    pub reason: String,
}

pub struct TreeBuilder<'o, O: PositionOracle> {
    oracle: &'o O,
    tree: MoveTree,
    cursor: Cursor<O::Position>,
    stack: Vec<Cursor<O::Position>>,
    /// Position reached at every node, for rewinding on `(`.
    positions: HashMap<NodeId, O::Position>,
    skipped: Vec<SkippedMove>,
}

impl<'o, O: PositionOracle> TreeBuilder<'o, O> {
    /// Start from the oracle's initial position.
    pub fn new(oracle: &'o O) -> Self {
        let position = oracle.initial_position();
        Self::with_position(oracle, position)
    }

    /// Start from a set-up position.
    pub fn from_fen(oracle: &'o O, fen: &str) -> Result<Self, OracleError> {
        let position = oracle.position_from_fen(fen)?;
        Ok(Self::with_position(oracle, position))
    }

    fn with_position(oracle: &'o O, position: O::Position) -> Self {
        let tree = MoveTree::new(oracle.position_to_fen(&position));
        let root_id = tree.root_id();

        let mut positions = HashMap::new();
        positions.insert(root_id, position.clone());

        TreeBuilder {
            oracle,
            tree,
            cursor: Cursor {
                node_id: root_id,
                position,
            },
            stack: Vec::new(),
            positions,
            skipped: Vec::new(),
        }
    }

    /// Apply one token.
    pub fn feed(&mut self, token: Token) {
        trace!(?token, node = %self.cursor.node_id, depth = self.stack.len(), "token");

        match token {
            Token::Move(notation) => self.push_move(notation),
            Token::VariationStart => self.start_variation(),
            Token::VariationEnd => self.end_variation(),
            Token::Comment(text) | Token::Nag(text) => {
                if let Err(e) = self.tree.append_comment(self.cursor.node_id, &text) {
                    warn!(error = %e, "Cursor lost its node");
                }
            }
            Token::Result(result) => {
                if self.stack.is_empty() {
                    self.tree.set_result(Some(result));
                }
            }
        }
    }

    pub fn feed_all(&mut self, tokens: impl IntoIterator<Item = Token>) {
        for token in tokens {
            self.feed(token);
        }
    }

    fn push_move(&mut self, notation: String) {
        let parent = self.cursor.node_id;
        match self.oracle.apply_move(&self.cursor.position, &notation) {
            Ok((applied, next)) => {
                let fen = self.oracle.position_to_fen(&next);
                match self.tree.add_move(applied, fen, parent) {
                    Ok(id) => {
                        self.positions.insert(id, next.clone());
                        self.cursor = Cursor {
                            node_id: id,
                            position: next,
                        };
                    }
                    Err(e) => warn!(error = %e, "Cursor lost its node"),
                }
            }
            Err(e) => {
                let ply = self.tree.depth(parent).unwrap_or_default() + 1;
                warn!(san = %notation, reason = %e, ply, "Skipping move rejected by oracle");
                self.skipped.push(SkippedMove {
                    notation,
                    parent,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Save the cursor and rewind it to the parent of the current node: the
    /// upcoming moves replace the move just played.
    fn start_variation(&mut self) {
        self.stack.push(self.cursor.clone());

        let parent = self
            .tree
            .node(self.cursor.node_id)
            .and_then(|node| node.parent);
        if let Some(parent_id) = parent {
            if let Some(position) = self.positions.get(&parent_id) {
                self.cursor = Cursor {
                    node_id: parent_id,
                    position: position.clone(),
                };
            }
        }
    }

    fn end_variation(&mut self) {
        match self.stack.pop() {
            Some(saved) => self.cursor = saved,
            None => warn!(node = %self.cursor.node_id, "Ignoring ')' without an open variation"),
        }
    }

    /// Moves dropped so far.
    pub fn skipped(&self) -> &[SkippedMove] {
        &self.skipped
    }

    pub fn finish(self) -> MoveTree {
        self.into_parts().0
    }

    pub fn into_parts(self) -> (MoveTree, Vec<SkippedMove>) {
        if !self.stack.is_empty() {
            warn!(open = self.stack.len(), "Movetext ended inside a variation");
        }
        debug!(
            nodes = self.tree.len(),
            skipped = self.skipped.len(),
            "Built move tree"
        );
        (self.tree, self.skipped)
    }
}

/// Tokenize and build in one go, from the oracle's initial position.
pub fn build_tree<O: PositionOracle>(movetext: &str, oracle: &O) -> MoveTree {
    let mut builder = TreeBuilder::new(oracle);
    builder.feed_all(tokenize(movetext));
    builder.finish()
}

/// Play `notation` from the tree's current node.
///
/// If that move was already played here the existing node becomes current
/// instead of a duplicate being added.
pub fn play_move<O: PositionOracle>(
    tree: &mut MoveTree,
    oracle: &O,
    notation: &str,
) -> Result<NodeId, PlayError> {
    let current = tree.current_node();
    let position = oracle.position_from_fen(&current.fen)?;
    let (applied, next) = oracle.apply_move(&position, notation)?;

    let current_id = current.id;
    if let Some(existing) = tree.find_child_by_uci(current_id, &applied.uci) {
        tree.go_to_node(existing)?;
        return Ok(existing);
    }

    let fen = oracle.position_to_fen(&next);
    Ok(tree.add_move(applied, fen, current_id)?)
}
