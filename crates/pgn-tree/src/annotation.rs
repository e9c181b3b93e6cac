//! Embedded comment directives: `[%draw arrow,...]` and `[%clk ...]`.
//!
//! Everything here works on plain comment strings and never fails. Text that
//! only looks like a directive is left alone as prose.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Colour reported for arrows written without one.
pub const DEFAULT_ARROW_COLOR: &str = "default";

static ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[%draw[\s,]+arrow[\s,]+([a-h][1-8])[\s,]+([a-h][1-8])(?:[\s,]+([^\s,;\]][^;\]]*?))?[\s,]*\]",
    )
    .expect("arrow pattern is valid")
});

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[%clk\s+(\d+):(\d+):(\d+)(?:\.(\d*))?\s*\]").expect("clock pattern is valid")
});

static EMPTY_BRACES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*\}").expect("brace pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub from: String,
    pub to: String,
    pub color: String,
}

/// Remaining time parsed from a `[%clk]` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub tenths: u32,
}

impl fmt::Display for Clock {
    /// `1:05:09`, `05:09`, or `00:07.4` when time is short.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}:", self.hours)?;
        }
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)?;
        if self.hours == 0 && self.minutes == 0 && self.seconds <= 20 {
            write!(f, ".{}", self.tenths)?;
        }
        Ok(())
    }
}

/// All arrows in `comment`, in order of appearance.
pub fn extract_arrows(comment: &str) -> Vec<Arrow> {
    ARROW_RE
        .captures_iter(comment)
        .map(|cap| Arrow {
            from: cap[1].to_string(),
            to: cap[2].to_string(),
            color: cap
                .get(3)
                .map(|m| m.as_str().trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_ARROW_COLOR.to_string()),
        })
        .collect()
}

/// The time string of the first clock directive, e.g. `0:04:59.2`.
pub fn extract_clock(comment: &str) -> Option<String> {
    let cap = CLOCK_RE.captures(comment)?;
    let whole = cap.get(0)?.as_str();
    let time = whole
        .trim_start_matches("[%clk")
        .trim_end_matches(']')
        .trim();
    Some(time.to_string())
}

/// The first clock directive as numbers.
pub fn parse_clock(comment: &str) -> Option<Clock> {
    let cap = CLOCK_RE.captures(comment)?;
    Some(Clock {
        hours: cap[1].parse().ok()?,
        minutes: cap[2].parse().ok()?,
        seconds: cap[3].parse().ok()?,
        tenths: cap
            .get(4)
            .and_then(|m| m.as_str().get(0..1))
            .and_then(|d| d.parse().ok())
            .unwrap_or(0),
    })
}

/// `comment` with every arrow and clock directive removed, empty braces
/// dropped and whitespace collapsed.
pub fn strip_annotations(comment: &str) -> String {
    let mut text = comment.to_string();
    // Removing one directive can splice the halves of another together.
    loop {
        let stripped = ARROW_RE.replace_all(&text, " ");
        let stripped = CLOCK_RE.replace_all(&stripped, " ");
        let stripped = EMPTY_BRACES_RE.replace_all(&stripped, " ").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rebuild a comment after the user edited only its prose: the new text
/// followed by the arrows and clock found in `previous`.
pub fn merge_annotations(new_text: &str, previous: &str) -> String {
    let mut merged = new_text.trim().to_string();

    for arrow in extract_arrows(previous) {
        merged.push_str(&format!(" [%draw arrow,{},{}", arrow.from, arrow.to));
        if arrow.color != DEFAULT_ARROW_COLOR {
            merged.push(',');
            merged.push_str(&arrow.color);
        }
        merged.push(']');
    }
    if let Some(clock) = extract_clock(previous) {
        merged.push_str(&format!(" [%clk {clock}]"));
    }

    merged.trim().to_string()
}
