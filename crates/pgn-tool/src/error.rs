//! Tool error types

use std::path::PathBuf;

use pgn_tree::OracleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Invalid PGN_TOOL_START_FEN: {0}")]
    StartFen(#[from] OracleError),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No PGN files found in {0}")]
    NoFiles(String),

    #[error("{0} game(s) did not survive a write/read round trip")]
    RoundTrip(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
