//! Issue aggregation over a finished report.
//!
//! A report is split into `## ` sections (headings inside fenced blocks do
//! not count). Each section whose heading names a tool is handed to that
//! tool's parser. A language group heading is only checked for the error
//! line written when the whole group could not run. All other sections are
//! ignored. Issues keep section order and are never deduplicated.

use serde::Serialize;

use crate::lang::Language;
use crate::parse::{
    fenced_content, is_blank, parse_section, FenceLine, FenceTracker, Issue, ParseContext,
};
use crate::report::markdown::{header_path, ERROR_PREFIX};
use crate::tool::ToolKind;

/// A `## ` section of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub title: &'a str,
    pub body: String,
}

/// What became of one tool section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// Output was parsed into this many issues.
    Parsed(usize),
    /// The tool produced no output.
    Empty,
    /// The tool could not run.
    ToolFailed(String),
    /// The tool was killed after its timeout.
    TimedOut,
    /// The output could not be parsed.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub tool: ToolKind,
    pub outcome: SectionOutcome,
}

/// A language group that could not run at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    pub language: Language,
    pub message: String,
}

/// Issues plus per-section outcomes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregation {
    pub issues: Vec<Issue>,
    pub sections: Vec<SectionReport>,
    pub group_failures: Vec<GroupFailure>,
}

/// Split `report` at `## ` headings that are outside fenced blocks.
///
/// Text before the first heading is not part of any section.
pub fn split_sections(report: &str) -> Vec<Section<'_>> {
    let mut sections: Vec<Section<'_>> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut title: Option<&str> = None;
    let mut tracker = FenceTracker::new();

    for line in report.lines() {
        if !tracker.is_inside() {
            if let Some(heading) = line.strip_prefix("## ") {
                if let Some(t) = title.take() {
                    sections.push(Section {
                        title: t,
                        body: body.join("\n"),
                    });
                }
                body.clear();
                title = Some(heading.trim());
                continue;
            }
        }
        tracker.feed(line);
        if title.is_some() {
            body.push(line);
        }
    }

    if let Some(t) = title {
        sections.push(Section {
            title: t,
            body: body.join("\n"),
        });
    }

    sections
}

/// Lines of `body` that are outside every fenced block.
fn narrative_lines(body: &str) -> Vec<&str> {
    let mut tracker = FenceTracker::new();
    body.lines()
        .filter(|line| tracker.feed(line) == FenceLine::Outside)
        .collect()
}

/// Message of the first `**Error running ...:**` line outside fences.
fn error_message(narrative: &[&str]) -> Option<String> {
    narrative.iter().find_map(|line| {
        let rest = line.trim().strip_prefix(ERROR_PREFIX)?;
        let (_, message) = rest.split_once(":**")?;
        Some(message.trim().to_string())
    })
}

fn classify(tool: ToolKind, body: &str, ctx: &ParseContext) -> (SectionOutcome, Vec<Issue>) {
    let narrative = narrative_lines(body);

    if let Some(message) = error_message(&narrative) {
        return (SectionOutcome::ToolFailed(message), Vec::new());
    }

    if narrative
        .iter()
        .any(|line| line.trim().starts_with('_') && line.contains(" timed out after "))
    {
        return (SectionOutcome::TimedOut, Vec::new());
    }

    match parse_section(tool, body, ctx) {
        Ok(issues) if issues.is_empty() => {
            let outcome = if is_blank(&fenced_content(body)) {
                SectionOutcome::Empty
            } else {
                SectionOutcome::Parsed(0)
            };
            (outcome, issues)
        }
        Ok(issues) => (SectionOutcome::Parsed(issues.len()), issues),
        Err(e) => {
            tracing::warn!(tool = %tool, error = %e, "skipping malformed section");
            (SectionOutcome::Malformed(e.to_string()), Vec::new())
        }
    }
}

/// Parse every tool section of `report`, with per-section outcomes.
pub fn aggregate_detailed(report: &str) -> Aggregation {
    let ctx = match header_path(report) {
        Some(root) => ParseContext::new(root),
        None => ParseContext::default(),
    };

    let mut aggregation = Aggregation::default();
    for section in split_sections(report) {
        if let Some(language) = Language::from_heading(section.title) {
            if let Some(message) = error_message(&narrative_lines(&section.body)) {
                tracing::debug!(language = %language, "language group failed");
                aggregation.group_failures.push(GroupFailure { language, message });
            }
            continue;
        }

        let Some(tool) = ToolKind::from_heading(section.title) else {
            tracing::trace!(title = section.title, "ignoring non-tool section");
            continue;
        };

        let (outcome, issues) = classify(tool, &section.body, &ctx);
        tracing::debug!(tool = %tool, ?outcome, "aggregated section");
        aggregation.issues.extend(issues);
        aggregation.sections.push(SectionReport { tool, outcome });
    }

    aggregation
}

/// Parse every tool section of `report` into issues, in section order.
pub fn aggregate(report: &str) -> Vec<Issue> {
    aggregate_detailed(report).issues
}
