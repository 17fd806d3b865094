//! jscpd JSON report parser (`jscpd-report.json`).

use serde_json::Value;

use super::{decode_json, json_records, Issue, ParseContext, ParseError, Severity};
use crate::tool::ToolKind;

const RULE: &str = "duplicate-block";
const FIX: &str = "Extract into shared function/module";

fn location(side: Option<&Value>) -> Option<(&str, u64)> {
    let side = side?;
    let name = side.get("name").and_then(Value::as_str)?;
    let line = side.get("startLine").and_then(Value::as_u64)?;
    Some((name, line))
}

pub fn parse(content: &str, ctx: &ParseContext) -> Result<Vec<Issue>, ParseError> {
    let value = decode_json(ToolKind::Jscpd, content)?;
    let duplicates = json_records(ToolKind::Jscpd, value, "duplicates")?;

    let issues = duplicates
        .iter()
        .filter_map(|dup| {
            let (first, first_line) = location(dup.get("firstFile"))?;
            let (second, second_line) = location(dup.get("secondFile"))?;
            let lines = dup.get("lines").and_then(Value::as_u64).unwrap_or(0);

            Some(Issue {
                file: ctx.file(first),
                line: first_line,
                severity: Severity::Warning,
                rule: RULE.to_string(),
                description: format!(
                    "Duplicated block ({} lines). Also in {}:{}",
                    lines,
                    ctx.file(second),
                    second_line
                ),
                fix: FIX.to_string(),
            })
        })
        .collect();

    Ok(issues)
}
