//! Radon cyclomatic complexity (`radon cc`) and maintainability index
//! (`radon mi`) parsers.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Issue, ParseContext, Severity};

const COMPLEXITY_RULE: &str = "radon-complexity";
const COMPLEXITY_FIX: &str = "Refactor to reduce cyclomatic complexity";
const MAINTAINABILITY_RULE: &str = "radon-maintainability";
const MAINTAINABILITY_FIX: &str = "Improve code structure and readability";

lazy_static! {
    /// Block entry under a file header: `    F 3:0 name - C (12)`.
    static ref BLOCK_ENTRY: Regex =
        Regex::new(r"^\s+([FMC])\s+(\d+):\d+\s+(.+?\s+-\s+[A-F](?:\s+\(\d+\))?)\s*$").unwrap();
    /// Flat entry: `path:line: text - grade`.
    static ref FLAT_ENTRY: Regex = Regex::new(r"^([^:\s][^:]*):(\d+):(.*\s-\s.*)$").unwrap();
}

/// Parse `radon cc -s` output.
///
/// Accepts radon's native layout (a file header line followed by indented
/// block entries) as well as flat `path:line: text` entries.
pub fn parse_complexity(content: &str, ctx: &ParseContext) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut current_file: Option<&str> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = FLAT_ENTRY.captures(line) {
            let Ok(line_no) = caps[2].parse::<u64>() else {
                continue;
            };
            issues.push(complexity_issue(ctx.file(&caps[1]), line_no, caps[3].trim()));
            continue;
        }

        if let Some(caps) = BLOCK_ENTRY.captures(line) {
            let (Some(file), Ok(line_no)) = (current_file, caps[2].parse::<u64>()) else {
                continue;
            };
            let info = format!("{} {}", &caps[1], &caps[3]);
            issues.push(complexity_issue(ctx.file(file), line_no, &info));
            continue;
        }

        // An unindented line without a grade separator names the next file.
        if !line.starts_with(char::is_whitespace) && !line.contains(" - ") {
            current_file = Some(line.trim());
        }
    }

    issues
}

fn complexity_issue(file: String, line: u64, info: &str) -> Issue {
    Issue {
        file,
        line,
        severity: Severity::Warning,
        rule: COMPLEXITY_RULE.to_string(),
        description: format!("High complexity: {}", info),
        fix: COMPLEXITY_FIX.to_string(),
    }
}

/// Severity for a maintainability grade.
fn grade_severity(grade: char) -> Severity {
    match grade {
        'A' | 'B' => Severity::Info,
        'C' => Severity::Warning,
        'D' | 'E' | 'F' => Severity::Error,
        _ => Severity::Warning,
    }
}

/// Parse `radon mi` output (`path - A` or `path - A (72.10)` with `-s`).
pub fn parse_maintainability(content: &str, ctx: &ParseContext) -> Vec<Issue> {
    content
        .lines()
        .filter_map(|line| {
            let (file, grade_part) = line.split_once(" - ")?;
            let file = file.trim();
            let grade_part = grade_part.trim();
            let token = grade_part.split_whitespace().next()?;

            let mut chars = token.chars();
            let grade = chars.next().filter(|c| c.is_ascii_alphabetic())?;
            if chars.next().is_some() || file.is_empty() {
                return None;
            }

            Some(Issue {
                file: ctx.file(file),
                line: 0,
                severity: grade_severity(grade.to_ascii_uppercase()),
                rule: MAINTAINABILITY_RULE.to_string(),
                description: format!("Maintainability grade: {}", grade_part),
                fix: MAINTAINABILITY_FIX.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_native_blocks() {
        let out = "app.py\n    F 3:0 complex_function - D (22)\n    M 10:4 Service.handle - C (11)\npkg/util.py\n    C 1:0 Helper - C (13)\n";
        let issues = parse_complexity(out, &ParseContext::default());
        assert_eq!(issues.len(), 3);

        assert_eq!(issues[0].file, "app.py");
        assert_eq!(issues[0].line, 3);
        assert_eq!(issues[0].rule, COMPLEXITY_RULE);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].description, "High complexity: F complex_function - D (22)");

        assert_eq!(issues[1].line, 10);
        assert_eq!(issues[2].file, "pkg/util.py");
        assert_eq!(issues[2].line, 1);
    }

    #[test]
    fn test_complexity_flat_lines() {
        let out = "/repo/app.py:12: complex_function - C (11)";
        let ctx = ParseContext::new("/repo");
        let issues = parse_complexity(out, &ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].file, "app.py");
        assert_eq!(issues[0].line, 12);
        assert_eq!(issues[0].description, "High complexity: complex_function - C (11)");
    }

    #[test]
    fn test_complexity_skips_malformed() {
        let out = "app.py\n    ERROR: invalid syntax (<unknown>, line 3)\n    F x:0 f - A (1)\nsummary text\n";
        assert!(parse_complexity(out, &ParseContext::default()).is_empty());
    }

    #[test]
    fn test_block_entry_without_header_skipped() {
        let out = "    F 3:0 complex_function - D (22)";
        assert!(parse_complexity(out, &ParseContext::default()).is_empty());
    }

    #[test]
    fn test_maintainability_grades() {
        let out = "app.py - F\nok.py - A (88.12)\nmeh.py - C (15.00)\nbad.py - D\n";
        let issues = parse_maintainability(out, &ParseContext::default());
        assert_eq!(issues.len(), 4);

        assert_eq!(issues[0].file, "app.py");
        assert_eq!(issues[0].line, 0);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].rule, MAINTAINABILITY_RULE);
        assert_eq!(issues[0].description, "Maintainability grade: F");

        assert_eq!(issues[1].severity, Severity::Info);
        assert_eq!(issues[1].description, "Maintainability grade: A (88.12)");
        assert_eq!(issues[2].severity, Severity::Warning);
        assert_eq!(issues[3].severity, Severity::Error);
    }

    #[test]
    fn test_maintainability_skips_errors() {
        let out = "broken.py - ERROR: invalid syntax\nno separator here\n - A\n";
        assert!(parse_maintainability(out, &ParseContext::default()).is_empty());
    }

    #[test]
    fn test_grade_severity_unknown() {
        assert_eq!(grade_severity('G'), Severity::Warning);
    }
}
