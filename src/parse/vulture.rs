//! Vulture dead-code report parser (`path:line: unused ... (NN% confidence)`).

use super::{Issue, ParseContext, Severity};

const RULE: &str = "vulture-dead-code";
const FIX: &str = "Remove unused code or mark as intentionally unused";

pub fn parse(content: &str, ctx: &ParseContext) -> Vec<Issue> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter(|line| line.contains("unused"))
        .filter_map(|line| {
            let mut parts = line.splitn(3, ':');
            let file = parts.next()?.trim();
            let line_no: u64 = parts.next()?.trim().parse().ok()?;
            let description = parts.next()?.trim();
            if file.is_empty() {
                return None;
            }

            Some(Issue {
                file: ctx.file(file),
                line: line_no,
                severity: Severity::Warning,
                rule: RULE.to_string(),
                description: description.to_string(),
                fix: FIX.to_string(),
            })
        })
        .collect()
}
