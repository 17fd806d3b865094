//! Parsers that turn raw tool output into normalized issues.
//!
//! There is exactly one parser per tool. It accepts the tool's raw output,
//! which is also what the report stores inside the tool's fenced block, so
//! the same parser serves a live run and a replay of a saved report.
//!
//! Record-level problems (a line without enough fields, a non-numeric line
//! number) skip that record. Only a whole input that cannot be read at all,
//! such as JSON that does not parse, is reported as a [`ParseError`].

mod bandit;
mod eslint;
pub mod fence;
mod jscpd;
mod lint_codes;
mod radon;
mod semgrep;
mod types;
mod vulture;

pub use fence::{fence_for, fenced_content, FenceLine, FenceTracker};
pub use types::{Issue, Severity, NO_FIX};

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tool::ToolKind;

/// Text stored in a section when a tool produced nothing.
pub const NO_OUTPUT: &str = "No output or errors occurred.";

/// Errors that abort parsing of one tool's output.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{tool} output is not valid JSON: {source}")]
    InvalidJson {
        tool: ToolKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{tool} output has unexpected shape: {reason}")]
    UnexpectedShape { tool: ToolKind, reason: String },
}

/// Context shared by all parsers of one report.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// The analyzed path. File names under it are made relative to it.
    pub root: Option<PathBuf>,
}

impl ParseContext {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    /// Normalize a file path reported by a tool.
    pub fn file(&self, raw: &str) -> String {
        normalize_path(raw, self.root.as_deref())
    }
}

/// Normalize a tool-reported file path.
///
/// Paths under `root` become relative to it; when `root` is itself the file,
/// the file name is used. `./` prefixes are dropped and separators are
/// always `/`.
pub fn normalize_path(raw: &str, root: Option<&Path>) -> String {
    let unified = raw.trim().replace('\\', "/");

    if let Some(root) = root {
        let root_str = root.to_string_lossy().replace('\\', "/");
        let root_str = strip_dot_prefix(root_str.trim_end_matches('/'));

        if !root_str.is_empty() {
            let candidate = strip_dot_prefix(&unified);
            if candidate == root_str {
                return candidate
                    .rsplit('/')
                    .next()
                    .unwrap_or(candidate)
                    .to_string();
            }
            if let Some(rel) = candidate
                .strip_prefix(root_str)
                .and_then(|rest| rest.strip_prefix('/'))
            {
                if !rel.is_empty() {
                    return strip_dot_prefix(rel).to_string();
                }
            }
        }
    }

    strip_dot_prefix(&unified).to_string()
}

fn strip_dot_prefix(mut s: &str) -> &str {
    while let Some(rest) = s.strip_prefix("./") {
        s = rest;
    }
    s
}

/// Whether a tool's output carries no findings at all.
pub fn is_blank(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed == NO_OUTPUT
}

/// Parse raw output of `tool` into issues.
pub fn parse_output(
    tool: ToolKind,
    content: &str,
    ctx: &ParseContext,
) -> Result<Vec<Issue>, ParseError> {
    if is_blank(content) {
        return Ok(Vec::new());
    }

    let issues = match tool {
        ToolKind::Pylint => lint_codes::parse_pylint(content, ctx),
        ToolKind::Flake8 => lint_codes::parse_flake8(content, ctx),
        ToolKind::Bandit => bandit::parse(content, ctx),
        ToolKind::Vulture => vulture::parse(content, ctx),
        ToolKind::RadonComplexity => radon::parse_complexity(content, ctx),
        ToolKind::RadonMaintainability => radon::parse_maintainability(content, ctx),
        ToolKind::ESLint => eslint::parse(content, ctx)?,
        ToolKind::Semgrep => semgrep::parse(content, ctx)?,
        ToolKind::Jscpd => jscpd::parse(content, ctx)?,
    };

    tracing::trace!(tool = %tool, count = issues.len(), "parsed tool output");
    Ok(issues)
}

/// Parse one report section: only the fenced blocks are read.
pub fn parse_section(
    tool: ToolKind,
    section: &str,
    ctx: &ParseContext,
) -> Result<Vec<Issue>, ParseError> {
    parse_output(tool, &fenced_content(section), ctx)
}

/// Decode JSON output, mapping failures to a typed error.
fn decode_json(tool: ToolKind, content: &str) -> Result<serde_json::Value, ParseError> {
    serde_json::from_str(content.trim()).map_err(|source| ParseError::InvalidJson { tool, source })
}

/// Extract the record array from a JSON document that is either a bare
/// array or an object holding the array under `key`.
fn json_records(
    tool: ToolKind,
    value: serde_json::Value,
    key: &str,
) -> Result<Vec<serde_json::Value>, ParseError> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Object(mut map) => match map.remove(key) {
            Some(serde_json::Value::Array(items)) => Ok(items),
            Some(_) => Err(ParseError::UnexpectedShape {
                tool,
                reason: format!("`{}` is not an array", key),
            }),
            None => Ok(Vec::new()),
        },
        _ => Err(ParseError::UnexpectedShape {
            tool,
            reason: "expected an array or an object".to_string(),
        }),
    }
}
