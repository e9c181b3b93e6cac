//! Error types for the move tree, the position oracle and PGN loading.

use thiserror::Error;

use crate::tree::NodeId;

/// Structural misuse of a [`MoveTree`](crate::MoveTree).
///
/// Correct UI code never triggers these; seeing one means a caller held a
/// stale node id or tried to remove the root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Parent node {0} not found")]
    ParentNotFound(NodeId),

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Cannot delete root node")]
    CannotDeleteRoot,

    #[error("Node ids exhausted")]
    IdsExhausted,

    #[error("Invalid tree snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Rejections reported by a [`PositionOracle`](crate::PositionOracle).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Invalid move notation '{notation}': {reason}")]
    InvalidNotation { notation: String, reason: String },

    #[error("Illegal move '{notation}': {reason}")]
    IllegalMove { notation: String, reason: String },

    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
}

/// Failure to play a move from the current node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Failure to load a game from PGN text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("Start position error: {0}")]
    StartPosition(#[from] OracleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_id() {
        assert_eq!(
            TreeError::ParentNotFound(NodeId::new(7)).to_string(),
            "Parent node n7 not found"
        );
        assert_eq!(TreeError::NodeNotFound(NodeId::new(3)).to_string(), "Node n3 not found");
    }
}
