//! Splits model output into plain and emphasized runs using the `**...**` convention.

use regex::Regex;
use std::sync::OnceLock;

static EMPHASIS: OnceLock<Regex> = OnceLock::new();

fn emphasis_pattern() -> &'static Regex {
    EMPHASIS.get_or_init(|| Regex::new(r"\*\*.*?\*\*").expect("emphasis pattern is valid"))
}

/// A run of text with uniform styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Text with emphasis markers removed.
    pub text: String,
    /// Whether the run was wrapped in `**` markers.
    pub emphasized: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            emphasized: false,
        }
    }

    fn emphasized(text: &str) -> Self {
        Self {
            text: text.to_string(),
            emphasized: true,
        }
    }
}

/// One non-blank source line broken into runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Runs in source order.
    pub segments: Vec<Segment>,
}

impl Line {
    /// Whether every run on the line is emphasized.
    pub fn fully_emphasized(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|segment| segment.emphasized)
    }
}

/// Split a single line into alternating plain and emphasized runs.
///
/// Matches are non-greedy and never nest; an unpaired `**` stays in the plain text. Empty plain
/// runs between adjacent matches are dropped.
pub fn split_emphasis(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in emphasis_pattern().find_iter(line) {
        if found.start() > cursor {
            segments.push(Segment::plain(&line[cursor..found.start()]));
        }
        let marked = found.as_str();
        segments.push(Segment::emphasized(&marked[2..marked.len() - 2]));
        cursor = found.end();
    }
    if cursor < line.len() {
        segments.push(Segment::plain(&line[cursor..]));
    }
    segments
}

/// Break model output into renderable lines.
///
/// Blank lines are skipped, as are whitespace-only plain runs left over after splitting.
pub fn layout(text: &str) -> Vec<Line> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Line {
            segments: split_emphasis(line)
                .into_iter()
                .filter(|segment| segment.emphasized || !segment.text.trim().is_empty())
                .collect(),
        })
        .filter(|line| !line.segments.is_empty())
        .collect()
}

/// Count emphasized and plain runs across a laid-out document.
pub fn run_counts(lines: &[Line]) -> (usize, usize) {
    lines
        .iter()
        .flat_map(|line| line.segments.iter())
        .fold((0, 0), |(emphasized, plain), segment| {
            if segment.emphasized {
                (emphasized + 1, plain)
            } else {
                (emphasized, plain + 1)
            }
        })
}
