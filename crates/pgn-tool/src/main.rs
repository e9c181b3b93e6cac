//! Inspect and re-export branching PGN files.
//!
//! Usage:
//!   pgn-tool show <file.pgn> [--no-comments]
//!   pgn-tool branches <file.pgn> [--json]
//!   pgn-tool annotations <file.pgn>
//!   pgn-tool check <pgn_dir>
//!
//! Environment: PGN_TOOL_START_FEN, PGN_TOOL_COMMENTS, PGN_TOOL_MAX_GAMES, RUST_LOG.

mod config;
mod error;

use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;

use pgn_tree::{
    extract_arrows, parse_clock, parse_games_with, strip_annotations, to_pgn, to_pgn_with_headers,
    tokenize, GameData, MoveTree, ShakmatyOracle, TreeBuilder, WriteOptions,
};
use tracing::{info, warn};

use crate::config::ToolConfig;
use crate::error::ToolError;

fn usage(program: &str) -> String {
    format!("{program} <show|branches|annotations|check> <path> [--json] [--no-comments]")
}

fn read_games(path: &Path, config: &ToolConfig) -> Result<Vec<GameData>, ToolError> {
    let text = fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut games = parse_games_with(&text, &ShakmatyOracle, config.start_fen.as_deref());
    if let Some(max) = config.max_games {
        games.truncate(max);
    }
    info!(path = %path.display(), games = games.len(), "Loaded PGN file");
    Ok(games)
}

fn game_title(index: usize, game: &GameData) -> String {
    format!("Game {}: {} vs {}", index + 1, game.metadata.white, game.metadata.black)
}

fn show(path: &Path, config: &ToolConfig) -> Result<(), ToolError> {
    let options = WriteOptions {
        comments: config.comments,
        result: true,
    };
    for game in read_games(path, config)? {
        println!("{}", to_pgn_with_headers(&game, options));
    }
    Ok(())
}

fn branches(path: &Path, config: &ToolConfig, json: bool) -> Result<(), ToolError> {
    let games = read_games(path, config)?;

    if json {
        let listing: Vec<_> = games
            .iter()
            .map(|game| {
                serde_json::json!({
                    "white": game.metadata.white,
                    "black": game.metadata.black,
                    "branches": game.tree.all_branches(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for (index, game) in games.iter().enumerate() {
        println!("{}", game_title(index, game));
        for branch in game.tree.all_branches() {
            let sans: Vec<&str> = branch
                .node_ids
                .iter()
                .filter_map(|id| game.tree.node(*id))
                .filter(|node| node.mv.is_some())
                .map(|node| node.san.as_str())
                .collect();
            println!("  {:<12} {:>4} plies  {}", branch.name, branch.move_count, sans.join(" "));
        }
        println!();
    }
    Ok(())
}

fn annotations(path: &Path, config: &ToolConfig) -> Result<(), ToolError> {
    for (index, game) in read_games(path, config)?.iter().enumerate() {
        println!("{}", game_title(index, game));
        let tree = &game.tree;
        for id in tree.main_line_ids() {
            let Some(node) = tree.node(*id) else { continue };
            let Some(comment) = node.comment.as_deref() else { continue };

            let label = match node.mv {
                Some(_) => format!("{:>4} {}", tree.move_number(*id).unwrap_or_default(), node.san),
                None => "start".to_string(),
            };
            let clock = parse_clock(comment).map(|c| c.to_string()).unwrap_or_default();
            let arrows: Vec<String> = extract_arrows(comment)
                .iter()
                .map(|a| format!("{}{}:{}", a.from, a.to, a.color))
                .collect();
            println!(
                "  {:<12} {:>8}  [{}]  {}",
                label,
                clock,
                arrows.join(" "),
                strip_annotations(comment)
            );
        }
        println!();
    }
    Ok(())
}

/// Write the tree out and read it back; the second export must match.
fn round_trips(tree: &MoveTree) -> bool {
    let text = to_pgn(tree);
    let Ok(mut builder) = TreeBuilder::from_fen(&ShakmatyOracle, tree.initial_fen()) else {
        return false;
    };
    builder.feed_all(tokenize(&text));
    to_pgn(&builder.finish()) == text
}

fn check(dir: &str, config: &ToolConfig) -> anyhow::Result<()> {
    let pattern = format!("{}/*.pgn", dir);
    let pgn_files: Vec<_> = glob::glob(&pattern)?.filter_map(|p| p.ok()).collect();
    if pgn_files.is_empty() {
        return Err(ToolError::NoFiles(dir.to_string()).into());
    }

    println!("Found {} PGN files", pgn_files.len());
    let start = Instant::now();
    let mut total_games = 0usize;
    let mut total_skipped = 0usize;
    let mut failures = 0usize;

    for pgn_path in &pgn_files {
        let games = read_games(pgn_path, config)?;
        let skipped: usize = games.iter().map(|g| g.skipped.len()).sum();

        for (index, game) in games.iter().enumerate() {
            if !round_trips(&game.tree) {
                warn!(path = %pgn_path.display(), game = index + 1, "Round trip mismatch");
                failures += 1;
            }
        }

        println!(
            "  {:<40} {:>6} games {:>6} skipped moves",
            pgn_path.display(),
            games.len(),
            skipped
        );
        total_games += games.len();
        total_skipped += skipped;
    }

    println!();
    println!("Checked {} games in {:.1}s", total_games, start.elapsed().as_secs_f64());
    println!("  Skipped moves: {}", total_skipped);
    println!("  Round trip failures: {}", failures);

    if failures > 0 {
        return Err(ToolError::RoundTrip(failures).into());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pgn-tool");
    if args.len() < 3 {
        return Err(ToolError::Usage(usage(program)).into());
    }

    let mut config = ToolConfig::from_env()?;
    let mut json = false;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => json = true,
            "--no-comments" => config.comments = false,
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let target = &args[2];
    match args[1].as_str() {
        "show" => show(Path::new(target), &config)?,
        "branches" => branches(Path::new(target), &config, json)?,
        "annotations" => annotations(Path::new(target), &config)?,
        "check" => check(target, &config)?,
        _ => return Err(ToolError::Usage(usage(program)).into()),
    }

    Ok(())
}
