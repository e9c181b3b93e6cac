//! PGN container handling: tag pairs, multi-game files, whole-game import
//! and export.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::builder::{build_tree, TreeBuilder};
use crate::error::PgnError;
use crate::game_data::{GameData, GameMetadata};
use crate::oracle::{PositionOracle, STANDARD_START_FEN};
use crate::token::tokenize;
use crate::tree::{GameResult, MoveTree};
use crate::writer::{to_pgn_with, WriteOptions};

/// One `[Name "value"]` tag pair occupying a whole line.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\[(\w+)\s+"((?:[^"\\]|\\.)*)"\s*\]\s*$"#).expect("tag pattern is valid")
});

const SEVEN_TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

fn tag_pair(line: &str) -> Option<(String, String)> {
    let cap = TAG_RE.captures(line)?;
    Some((cap[1].to_string(), unescape(&cap[2])))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            _ => out.push(ch),
        }
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Leading tag pairs and the movetext that follows them.
fn split_header_block(pgn: &str) -> (Vec<(String, String)>, &str) {
    let mut tags = Vec::new();
    let mut offset = 0;
    for line in pgn.split_inclusive('\n') {
        if !line.trim().is_empty() {
            match tag_pair(line) {
                Some(tag) => tags.push(tag),
                None => break,
            }
        }
        offset += line.len();
    }
    (tags, &pgn[offset..])
}

/// All tag pairs of the game's header block, in file order.
pub fn parse_headers(pgn: &str) -> Vec<(String, String)> {
    split_header_block(pgn).0
}

/// The movetext of a single game, headers removed.
///
/// Only the leading tag-pair lines go, so `[%clk ...]` and friends inside
/// comments are untouched.
pub fn strip_headers(pgn: &str) -> &str {
    split_header_block(pgn).1
}

/// Extract a string value from a PGN header (e.g. WhiteTitle, BlackTitle).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    parse_headers(pgn)
        .into_iter()
        .find(|(name, _)| name == header_name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Extract an integer value from a PGN header.
pub fn extract_header_int(pgn: &str, header_name: &str) -> Option<i32> {
    extract_header(pgn, header_name)?.trim().parse().ok()
}

/// Split a multi-game file. A new game starts at the first tag pair that
/// follows movetext.
pub fn split_games(text: &str) -> Vec<String> {
    fn flush(games: &mut Vec<String>, current: &mut String) {
        let game = current.trim();
        if !game.is_empty() {
            games.push(game.to_string());
        }
        current.clear();
    }

    let mut games = Vec::new();
    let mut current = String::new();
    let mut in_movetext = false;

    for line in text.lines() {
        let is_tag = TAG_RE.is_match(line);
        if is_tag && in_movetext {
            flush(&mut games, &mut current);
            in_movetext = false;
        }
        if !is_tag && !line.trim().is_empty() {
            in_movetext = true;
        }
        current.push_str(line);
        current.push('\n');
    }
    flush(&mut games, &mut current);

    games
}

fn metadata_from_tags(tags: Vec<(String, String)>) -> GameMetadata {
    let mut metadata = GameMetadata {
        white: "?".to_string(),
        black: "?".to_string(),
        result: "*".to_string(),
        ..GameMetadata::default()
    };

    for (key, value) in &tags {
        let value = value.clone();
        match key.as_str() {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "Event" => metadata.event = Some(value),
            "Site" => metadata.site = Some(value),
            "Round" => metadata.round = Some(value),
            "ECO" => metadata.eco = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "FEN" => metadata.fen = Some(value),
            _ => {}
        }
    }

    metadata.tags = tags;
    metadata
}

/// Parse one game: headers into metadata, movetext into a tree.
pub fn parse_game<O: PositionOracle>(pgn: &str, oracle: &O) -> Result<GameData, PgnError> {
    parse_game_with(pgn, oracle, None)
}

/// Like [`parse_game`], starting from `start_fen` when the game has no
/// `[FEN]` tag.
pub fn parse_game_with<O: PositionOracle>(
    pgn: &str,
    oracle: &O,
    start_fen: Option<&str>,
) -> Result<GameData, PgnError> {
    let (tags, movetext) = split_header_block(pgn);
    let metadata = metadata_from_tags(tags);

    let mut builder = match metadata.fen.as_deref().or(start_fen) {
        Some(fen) => TreeBuilder::from_fen(oracle, fen)?,
        None => TreeBuilder::new(oracle),
    };
    builder.feed_all(tokenize(movetext));
    let (mut tree, skipped) = builder.into_parts();

    if tree.result().is_none() {
        tree.set_result(GameResult::from_pgn(&metadata.result));
    }

    Ok(GameData {
        metadata,
        tree,
        skipped,
    })
}

/// Rehydrate a tree from stored PGN. Never fails: an unusable `[FEN]` tag
/// falls back to the initial position.
pub fn load_tree<O: PositionOracle>(pgn: &str, oracle: &O) -> MoveTree {
    match parse_game(pgn, oracle) {
        Ok(game) => game.tree,
        Err(e) => {
            warn!(error = %e, "Ignoring unusable FEN tag");
            build_tree(strip_headers(pgn), oracle)
        }
    }
}

pub fn parse_games<O: PositionOracle>(text: &str, oracle: &O) -> Vec<GameData> {
    parse_games_with(text, oracle, None)
}

/// Parse every game in a file, dropping the ones that cannot be started.
pub fn parse_games_with<O: PositionOracle>(
    text: &str,
    oracle: &O,
    start_fen: Option<&str>,
) -> Vec<GameData> {
    let mut games = Vec::new();
    for (index, pgn) in split_games(text).iter().enumerate() {
        match parse_game_with(pgn, oracle, start_fen) {
            Ok(game) => games.push(game),
            Err(e) => warn!(game = index + 1, error = %e, "Skipping game"),
        }
    }
    debug!(games = games.len(), "Parsed PGN file");
    games
}

fn push_tag(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!("[{} \"{}\"]\n", name, escape(value)));
}

fn or_unknown<'a>(value: Option<&'a str>, unknown: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(unknown)
}

/// Full PGN for a game: the seven-tag roster, the remaining tags in their
/// file order, a blank line, then movetext.
pub fn to_pgn_with_headers(game: &GameData, options: WriteOptions) -> String {
    let metadata = &game.metadata;
    let result = game
        .tree
        .result()
        .map(|r| r.as_str())
        .unwrap_or(or_unknown(Some(metadata.result.as_str()), "*"));

    let mut out = String::new();
    push_tag(&mut out, "Event", or_unknown(metadata.event.as_deref(), "?"));
    push_tag(&mut out, "Site", or_unknown(metadata.site.as_deref(), "?"));
    push_tag(&mut out, "Date", or_unknown(metadata.date.as_deref(), "????.??.??"));
    push_tag(&mut out, "Round", or_unknown(metadata.round.as_deref(), "?"));
    push_tag(&mut out, "White", or_unknown(Some(metadata.white.as_str()), "?"));
    push_tag(&mut out, "Black", or_unknown(Some(metadata.black.as_str()), "?"));
    push_tag(&mut out, "Result", result);

    for (name, value) in &metadata.tags {
        if !SEVEN_TAG_ROSTER.contains(&name.as_str()) {
            push_tag(&mut out, name, value);
        }
    }
    if game.tree.initial_fen() != STANDARD_START_FEN && metadata.tag("FEN").is_none() {
        push_tag(&mut out, "SetUp", "1");
        push_tag(&mut out, "FEN", game.tree.initial_fen());
    }

    out.push('\n');
    out.push_str(&to_pgn_with(&game.tree, options));
    out.push('\n');
    out
}
