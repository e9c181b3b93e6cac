use serde::{Deserialize, Serialize};

use crate::builder::SkippedMove;
use crate::tree::MoveTree;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub event: Option<String>,
    pub site: Option<String>,
    pub round: Option<String>,
    pub eco: Option<String>,
    pub time_control: Option<String>,
    pub fen: Option<String>,
    /// Every tag pair in file order, including the ones above.
    pub tags: Vec<(String, String)>,
}

impl GameMetadata {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub tree: MoveTree,
    /// Moves dropped while building the tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedMove>,
}
