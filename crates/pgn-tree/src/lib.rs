//! Branching PGN move trees.
//!
//! Movetext with nested variations is tokenized, folded into an arena-backed
//! [`MoveTree`], edited by the UI layer, and written back out as PGN. Chess
//! rules are delegated to a [`PositionOracle`]; [`ShakmatyOracle`] is the
//! standard-chess implementation. Comment directives such as arrows and
//! clocks are handled by the functions in [`annotation`].

pub mod annotation;
pub mod builder;
pub mod error;
pub mod game_data;
pub mod layout;
pub mod oracle;
pub mod pgn;
pub mod token;
pub mod tree;
pub mod writer;

pub use annotation::{
    extract_arrows, extract_clock, merge_annotations, parse_clock, strip_annotations, Arrow, Clock,
};
pub use builder::{build_tree, play_move, SkippedMove, TreeBuilder};
pub use error::{OracleError, PgnError, PlayError, TreeError};
pub use game_data::{GameData, GameMetadata};
pub use layout::{layout, DisplayElement, ElementKind};
pub use oracle::{AppliedMove, PositionOracle, ShakmatyOracle, Side, STANDARD_START_FEN};
pub use pgn::{
    load_tree, parse_game, parse_game_with, parse_games, parse_games_with, split_games,
    to_pgn_with_headers,
};
pub use token::{tokenize, Token};
pub use tree::{Alternative, BranchInfo, GameResult, MoveTree, MoveTreeNode, NodeId};
pub use writer::{to_pgn, to_pgn_with, WriteOptions};
