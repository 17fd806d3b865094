//! Markdown rendering of report pieces.
//!
//! The heading texts and the `**Path**` header line are read back by the
//! aggregator, so they are produced only here.

use std::path::Path;

use crate::lang::Language;
use crate::parse::{fence_for, NO_OUTPUT};
use crate::tool::ToolKind;

pub const REPORT_TITLE: &str = "# Linting Report";
pub const PATH_LABEL: &str = "- **Path**: ";
pub const GENERATED_LABEL: &str = "- **Generated on**: ";
pub const FOOTER: &str = "*Report generated by lintreport*";
pub const SUMMARY_HEADING: &str = "LLM Summary";

/// Prefix of the inline line written when a tool could not run.
pub const ERROR_PREFIX: &str = "**Error running ";

/// What a tool section shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Raw stdout of a completed run.
    Output(String),
    /// The tool could not be run.
    Failed(String),
    /// The tool was killed after `secs` seconds.
    TimedOut { secs: u64 },
}

/// `# Linting Report` header with path and timestamp.
pub fn header(path: &Path, generated_on: &str) -> String {
    format!(
        "{}\n\n{}`{}`\n{}{}",
        REPORT_TITLE,
        PATH_LABEL,
        path.display(),
        GENERATED_LABEL,
        generated_on
    )
}

/// Extract the analyzed path from a report header, if present.
pub fn header_path(report: &str) -> Option<&str> {
    report.lines().find_map(|line| {
        let rest = line.trim_end().strip_prefix(PATH_LABEL)?;
        let path = rest.strip_prefix('`')?.strip_suffix('`')?;
        (!path.is_empty()).then_some(path)
    })
}

pub fn group_heading(language: Language) -> String {
    format!("## {}", language.heading())
}

/// A fenced block holding `content` verbatim, or the placeholder.
pub fn fenced(content: &str) -> String {
    let content = content.trim_end();
    let body = if content.trim().is_empty() { NO_OUTPUT } else { content };
    let fence = fence_for(body);
    format!("{fence}\n{body}\n{fence}")
}

/// Inline error line for a tool or a tool group.
pub fn error_line(name: &str, message: &str) -> String {
    format!("{}{}:** {}", ERROR_PREFIX, name, message.trim())
}

/// One `## <Tool>` section.
pub fn tool_section(tool: ToolKind, outcome: &ToolOutcome) -> String {
    let body = match outcome {
        ToolOutcome::Output(stdout) => fenced(stdout),
        ToolOutcome::Failed(message) => error_line(tool.display_name(), message),
        ToolOutcome::TimedOut { secs } => format!(
            "{}\n\n_{} timed out after {}s._",
            fenced(""),
            tool.display_name(),
            secs
        ),
    };
    format!("## {}\n\n{}", tool.heading(), body)
}

pub fn footer() -> String {
    format!("---\n\n{}\n", FOOTER)
}
