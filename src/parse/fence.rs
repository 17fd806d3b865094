//! Fenced code block handling.
//!
//! Tool output is stored in the report inside fenced blocks. Parsers only
//! ever look at what is inside a fence; everything else in a section is
//! narrative.

/// Classification of one line relative to fenced blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceLine {
    /// Opening fence marker.
    Open,
    /// Closing fence marker.
    Close,
    /// A line inside a fenced block.
    Inside,
    /// A line outside any fenced block.
    Outside,
}

/// Tracks whether successive lines are inside a fenced block.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open: Option<usize>,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tracker is currently inside a fenced block.
    pub fn is_inside(&self) -> bool {
        self.open.is_some()
    }

    /// The marker that closes the open block, if any.
    pub fn closing_fence(&self) -> Option<String> {
        self.open.map(|width| "`".repeat(width))
    }

    /// Classify the next line and advance the state.
    pub fn feed(&mut self, line: &str) -> FenceLine {
        let trimmed = line.trim();
        match self.open {
            Some(width) => {
                if backtick_run(trimmed) >= width && trimmed.chars().all(|c| c == '`') {
                    self.open = None;
                    FenceLine::Close
                } else {
                    FenceLine::Inside
                }
            }
            None => {
                let run = backtick_run(trimmed);
                // An info string may follow the opening marker, but it cannot
                // contain backticks.
                if run >= 3 && !trimmed[run..].contains('`') {
                    self.open = Some(run);
                    FenceLine::Open
                } else {
                    FenceLine::Outside
                }
            }
        }
    }
}

/// Number of leading backticks.
fn backtick_run(s: &str) -> usize {
    s.chars().take_while(|&c| c == '`').count()
}

/// Collect the content of every fenced block in `text`.
///
/// Blocks are joined with a newline. An unterminated block runs to the end of
/// the text.
pub fn fenced_content(text: &str) -> String {
    let mut tracker = FenceTracker::new();
    let mut lines = Vec::new();

    for line in text.lines() {
        if tracker.feed(line) == FenceLine::Inside {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Choose a fence marker that cannot be closed by `content` itself.
pub fn fence_for(content: &str) -> String {
    let longest = content
        .lines()
        .map(|l| backtick_run(l.trim()))
        .max()
        .unwrap_or(0);
    let width = if longest >= 3 { longest + 1 } else { 3 };
    "`".repeat(width)
}
