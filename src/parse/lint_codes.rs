//! Parsers for `file:line:col: CODE message` lines (Pylint, Flake8).

use super::{Issue, ParseContext, Severity, NO_FIX};

/// One successfully split lint line.
#[derive(Debug, PartialEq, Eq)]
struct CodeLine<'a> {
    file: &'a str,
    line: u64,
    code: &'a str,
    message: &'a str,
}

/// Split a `file:line[:col]: CODE[:] message` line.
///
/// Returns `None` for anything that does not carry a numeric line number
/// and a message code, which covers banners, score lines and blank lines.
fn split_code_line(raw: &str) -> Option<CodeLine<'_>> {
    let mut parts = raw.splitn(3, ':');
    let file = parts.next()?.trim();
    let line = parts.next()?.trim().parse::<u64>().ok()?;
    let mut rest = parts.next()?;

    if file.is_empty() {
        return None;
    }

    // Column is optional.
    if let Some((col, after)) = rest.split_once(':') {
        if col.trim().parse::<u64>().is_ok() {
            rest = after;
        }
    }

    let rest = rest.trim();
    let (token, message) = match rest.split_once(char::is_whitespace) {
        Some((token, message)) => (token, message),
        None => (rest, ""),
    };

    let code = token.trim_end_matches(':');
    let well_formed = code
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false)
        && code.chars().all(|c| c.is_ascii_alphanumeric());
    if !well_formed {
        return None;
    }

    let message = message.trim().trim_start_matches(':').trim();
    Some(CodeLine {
        file,
        line,
        code,
        message,
    })
}

fn parse_lines(content: &str, ctx: &ParseContext) -> Vec<Issue> {
    content
        .lines()
        .filter_map(|raw| {
            let parsed = split_code_line(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                tracing::trace!(line = raw, "skipping unrecognized lint line");
            }
            parsed
        })
        .map(|l| Issue {
            file: ctx.file(l.file),
            line: l.line,
            severity: Severity::from_code(l.code),
            rule: l.code.to_string(),
            description: if l.message.is_empty() {
                l.code.to_string()
            } else {
                l.message.to_string()
            },
            fix: NO_FIX.to_string(),
        })
        .collect()
}

/// Parse Pylint output produced with a `{path}:{line}:{column}: {msg_id}: {msg}` template.
pub fn parse_pylint(content: &str, ctx: &ParseContext) -> Vec<Issue> {
    parse_lines(content, ctx)
}

/// Parse Flake8 default output (`path:row:col: CODE text`).
pub fn parse_flake8(content: &str, ctx: &ParseContext) -> Vec<Issue> {
    parse_lines(content, ctx)
}
