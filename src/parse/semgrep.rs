//! Semgrep `--json` parser.

use serde_json::Value;

use super::{decode_json, json_records, Issue, ParseContext, ParseError, Severity, NO_FIX};
use crate::tool::ToolKind;

/// Map a semgrep severity or confidence label to a severity.
fn classify(label: &str) -> Severity {
    match label.to_ascii_uppercase().as_str() {
        "HIGH" | "ERROR" | "CRITICAL" => Severity::Error,
        "MEDIUM" | "WARNING" | "MODERATE" => Severity::Warning,
        _ => Severity::Info,
    }
}

/// Confidence wins over the rule severity unless it is LOW or missing.
fn effective_label(extra: Option<&Value>) -> String {
    let confidence = extra
        .and_then(|e| e.pointer("/metadata/confidence"))
        .and_then(Value::as_str)
        .unwrap_or("LOW");
    if !confidence.eq_ignore_ascii_case("LOW") {
        return confidence.to_string();
    }
    extra
        .and_then(|e| e.get("severity"))
        .and_then(Value::as_str)
        .unwrap_or("INFO")
        .to_string()
}

pub fn parse(content: &str, ctx: &ParseContext) -> Result<Vec<Issue>, ParseError> {
    let value = decode_json(ToolKind::Semgrep, content)?;
    let results = json_records(ToolKind::Semgrep, value, "results")?;

    let issues = results
        .iter()
        .filter_map(|hit| {
            let path = hit.get("path").and_then(Value::as_str)?;
            let extra = hit.get("extra");

            let rule = hit
                .get("check_id")
                .and_then(Value::as_str)
                .unwrap_or("semgrep-finding");
            let description = extra
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let fix = extra
                .and_then(|e| e.get("fix"))
                .and_then(Value::as_str)
                .filter(|f| !f.is_empty())
                .unwrap_or(NO_FIX);

            Some(Issue {
                file: ctx.file(path),
                line: hit.pointer("/start/line").and_then(Value::as_u64).unwrap_or(0),
                severity: classify(&effective_label(extra)),
                rule: rule.to_string(),
                description: description.trim().to_string(),
                fix: fix.to_string(),
            })
        })
        .collect();

    Ok(issues)
}
