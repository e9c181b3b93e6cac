//! Movetext tokenizer.
//!
//! A single left-to-right scan that never fails: anything it cannot classify
//! is handed downstream as a move candidate and left for the oracle to judge.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::tree::GameResult;

/// One lexical unit of PGN movetext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Move text with any `12.` / `12...` prefix removed.
    Move(String),
    VariationStart,
    VariationEnd,
    /// Comment body, whitespace-normalized, braces removed.
    Comment(String),
    /// `$` followed by its digits, e.g. `$14`.
    Nag(String),
    Result(GameResult),
}

/// Split movetext (headers already stripped) into tokens.
pub fn tokenize(movetext: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = movetext.char_indices().peekable();

    while let Some(&(_, ch)) = chars.peek() {
        match ch {
            '(' => {
                chars.next();
                tokens.push(Token::VariationStart);
            }
            ')' => {
                chars.next();
                tokens.push(Token::VariationEnd);
            }
            '{' => {
                chars.next();
                let body = take_until(&mut chars, movetext, |c| c == '}');
                chars.next(); // closing brace, if any
                tokens.push(Token::Comment(normalize_whitespace(body)));
            }
            ';' => {
                chars.next();
                let body = take_until(&mut chars, movetext, |c| c == '\n');
                tokens.push(Token::Comment(normalize_whitespace(body)));
            }
            '$' => {
                chars.next();
                let digits = take_until(&mut chars, movetext, |c| !c.is_ascii_digit());
                tokens.push(Token::Nag(format!("${digits}")));
            }
            // Stray closing brace outside a comment.
            '}' => {
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let word = take_until(&mut chars, movetext, is_delimiter);
                if let Some(token) = classify_word(word) {
                    tokens.push(token);
                }
            }
        }
    }

    tokens
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '{' | '}' | '$' | ';')
}

/// Consume characters up to (not including) the first one matching `stop`
/// and return the consumed slice.
fn take_until<'a>(
    chars: &mut Peekable<CharIndices<'a>>,
    source: &'a str,
    stop: impl Fn(char) -> bool,
) -> &'a str {
    let start = match chars.peek() {
        Some(&(idx, _)) => idx,
        None => return "",
    };
    let mut end = source.len();
    while let Some(&(idx, c)) = chars.peek() {
        if stop(c) {
            end = idx;
            break;
        }
        chars.next();
    }
    &source[start..end]
}

fn classify_word(word: &str) -> Option<Token> {
    if let Some(result) = GameResult::from_pgn(word) {
        return Some(Token::Result(result));
    }
    let mv = strip_move_number(word);
    if mv.is_empty() {
        // A bare move number such as "12." or "12...".
        return None;
    }
    Some(Token::Move(mv.to_string()))
}

/// Remove a leading `digits` + dots prefix. Words without dots after the
/// digits are returned untouched.
fn strip_move_number(word: &str) -> &str {
    let digits_end = word
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(word.len());
    if digits_end == 0 {
        return word;
    }
    let rest = &word[digits_end..];
    let stripped = rest.trim_start_matches('.');
    if stripped.len() == rest.len() {
        word
    } else {
        stripped
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
