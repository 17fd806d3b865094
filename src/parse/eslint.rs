//! ESLint `--format json` parser.

use serde_json::Value;

use super::{decode_json, json_records, Issue, ParseContext, ParseError, Severity, NO_FIX};
use crate::tool::ToolKind;

fn severity(level: Option<u64>) -> Severity {
    match level {
        Some(2) => Severity::Error,
        Some(1) => Severity::Warning,
        _ => Severity::Info,
    }
}

fn fix_text(message: &Value) -> String {
    message
        .get("fix")
        .and_then(|fix| fix.get("text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NO_FIX.to_string())
}

pub fn parse(content: &str, ctx: &ParseContext) -> Result<Vec<Issue>, ParseError> {
    let value = decode_json(ToolKind::ESLint, content)?;
    let files = json_records(ToolKind::ESLint, value, "results")?;

    let mut issues = Vec::new();
    for file_result in &files {
        let Some(file_path) = file_result.get("filePath").and_then(Value::as_str) else {
            continue;
        };
        let file = ctx.file(file_path);

        let messages = file_result
            .get("messages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for message in messages {
            let rule = message
                .get("ruleId")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let description = message
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();

            issues.push(Issue {
                file: file.clone(),
                line: message.get("line").and_then(Value::as_u64).unwrap_or(0),
                severity: severity(message.get("severity").and_then(Value::as_u64)),
                rule: rule.to_string(),
                description: description.to_string(),
                fix: fix_text(message),
            });
        }
    }

    Ok(issues)
}
