//! Bandit text report parser.
//!
//! Bandit prints free-form blocks. Every `>> Issue:` line starts a finding;
//! a `Location:` line that follows it fills in the file and line.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Issue, ParseContext, Severity};

const RULE_FALLBACK: &str = "bandit-issue";
const FIX: &str = "Review security implications";

lazy_static! {
    static ref TEST_ID: Regex = Regex::new(r"\[(B\d+)(?::[\w-]+)?\]").unwrap();
}

fn is_issue_line(line: &str) -> bool {
    line.contains(">>") || line.contains("Issue:")
}

/// Parse a `Location: path:line[:col]` line.
fn parse_location(line: &str) -> Option<(&str, u64)> {
    let rest = line.trim().strip_prefix("Location:")?;
    let mut parts = rest.splitn(3, ':');
    let file = parts.next()?.trim();
    let line = parts.next()?.trim().parse().ok()?;
    if file.is_empty() {
        return None;
    }
    Some((file, line))
}

pub fn parse(content: &str, ctx: &ParseContext) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();
    // Whether the last issue is still waiting for its location.
    let mut awaiting_location = false;

    for line in content.lines() {
        if is_issue_line(line) {
            let rule = TEST_ID
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| RULE_FALLBACK.to_string());

            issues.push(Issue {
                file: "unknown".to_string(),
                line: 0,
                severity: Severity::Warning,
                rule,
                description: line.trim().to_string(),
                fix: FIX.to_string(),
            });
            awaiting_location = true;
            continue;
        }

        if awaiting_location {
            if let Some((file, line_no)) = parse_location(line) {
                if let Some(last) = issues.last_mut() {
                    last.file = ctx.file(file);
                    last.line = line_no;
                }
                awaiting_location = false;
            }
        }
    }

    issues
}
