//! Tool configuration from environment variables

use std::env;

use pgn_tree::{PositionOracle, ShakmatyOracle};
use tracing::info;

use crate::error::ToolError;

#[derive(Clone, Debug)]
pub struct ToolConfig {
    /// Start position for games without a FEN tag
    pub start_fen: Option<String>,

    /// Keep comments in exported PGN
    pub comments: bool,

    /// Games processed per file
    pub max_games: Option<usize>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            start_fen: None,
            comments: true,
            max_games: None,
        }
    }
}

impl ToolConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ToolError> {
        let start_fen = match env::var("PGN_TOOL_START_FEN") {
            Ok(fen) if !fen.trim().is_empty() => {
                ShakmatyOracle.position_from_fen(fen.trim())?;
                info!(fen = %fen.trim(), "Using configured start position");
                Some(fen.trim().to_string())
            }
            _ => None,
        };

        let comments = match env::var("PGN_TOOL_COMMENTS") {
            Ok(v) => parse_flag(&v)
                .ok_or(ToolError::Config("PGN_TOOL_COMMENTS must be true or false"))?,
            Err(_) => true,
        };

        let max_games = match env::var("PGN_TOOL_MAX_GAMES") {
            Ok(v) => Some(
                v.trim()
                    .parse()
                    .map_err(|_| ToolError::Config("PGN_TOOL_MAX_GAMES must be a number"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            start_fen,
            comments,
            max_games,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
