//! Terminal output for analysis results.
//!
//! Supports three output formats:
//! - Markdown: the report text itself
//! - Pretty: colored terminal output for human readability
//! - JSON: issues, statistics and section outcomes for programmatic use

use colored::*;
use serde::Serialize;
use std::path::Path;

use crate::aggregate::{GroupFailure, SectionOutcome, SectionReport};
use crate::parse::{Issue, Severity};
use crate::stats::AnalysisSummary;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Pretty => "pretty",
            OutputFormat::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "pretty" => Some(OutputFormat::Pretty),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level JSON document.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
    pub sections: &'a [SectionReport],
    pub group_failures: &'a [GroupFailure],
    #[serde(flatten)]
    pub summary: &'a AnalysisSummary,
}

/// Render results as pretty-printed JSON.
pub fn render_json(
    path: Option<&str>,
    report_file: Option<&Path>,
    summary: &AnalysisSummary,
    sections: &[SectionReport],
    group_failures: &[GroupFailure],
) -> serde_json::Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        path,
        report_file: report_file.map(|p| p.display().to_string()),
        sections,
        group_failures,
        summary,
    };
    serde_json::to_string_pretty(&report)
}

/// Write results in JSON format.
pub fn write_json(
    path: Option<&str>,
    report_file: Option<&Path>,
    summary: &AnalysisSummary,
    sections: &[SectionReport],
    group_failures: &[GroupFailure],
) -> anyhow::Result<()> {
    let json = render_json(path, report_file, summary, sections, group_failures)?;
    println!("{}", json);
    Ok(())
}

/// Write results in pretty (human-readable) format.
pub fn write_pretty(
    path: Option<&str>,
    report_file: Option<&Path>,
    summary: &AnalysisSummary,
    sections: &[SectionReport],
    group_failures: &[GroupFailure],
) {
    println!();
    print!("  ");
    print!("{}", "lintreport".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    if let Some(path) = path {
        print!("  {}", "Analyzed: ".dimmed());
        println!("{}", path);
    }
    if let Some(file) = report_file {
        print!("  {}", "Report:   ".dimmed());
        println!("{}", file.display());
    }
    println!();

    if !group_failures.is_empty() {
        write_group_failures(group_failures);
        println!();
    }

    if !sections.is_empty() {
        write_sections(sections);
        println!();
    }

    if !summary.issues.is_empty() {
        write_issues(&summary.issues);
        println!();
    }

    write_totals(summary);
    println!();
}

fn write_group_failures(failures: &[GroupFailure]) {
    for f in failures {
        println!(
            "  {} {}",
            format!("{} linters skipped:", f.language.display_name()).red().bold(),
            f.message
        );
    }
}

fn write_sections(sections: &[SectionReport]) {
    println!("  {}", "Tools:".bold());
    for s in sections {
        print!("    {:<24}", s.tool.display_name());
        match &s.outcome {
            SectionOutcome::Parsed(n) => {
                let plural = if *n != 1 { "s" } else { "" };
                println!("{}", format!("{} issue{}", n, plural).green());
            }
            SectionOutcome::Empty => println!("{}", "no output".dimmed()),
            SectionOutcome::ToolFailed(msg) => println!("{} {}", "failed:".red(), msg),
            SectionOutcome::TimedOut => println!("{}", "timed out".yellow()),
            SectionOutcome::Malformed(msg) => {
                println!("{} {}", "unreadable output:".yellow(), msg.dimmed())
            }
        }
    }
}

fn write_issues(issues: &[Issue]) {
    println!("  {} ({}):", "Issues".bold(), issues.len());
    println!();

    for issue in issues {
        write_severity_tag(issue.severity);
        print!("   ");
        print!("{:<18}", issue.rule.dimmed());
        print!("{}", issue.file.blue());
        if issue.line > 0 {
            print!("{}", format!(":{}", issue.line).dimmed());
        }
        println!();

        println!("            {}", issue.description);
        if issue.fix != crate::parse::NO_FIX {
            println!("            {}", format!("fix: {}", issue.fix).dimmed());
        }
        println!();
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_totals(summary: &AnalysisSummary) {
    let counts = &summary.severity_counts;
    print!("  {}", format!("{} issues", summary.total_issues).bold());
    print!("  {}", format!("{} errors", counts.error).red());
    print!("  {}", format!("{} warnings", counts.warning).yellow());
    print!("  {}", format!("{} info", counts.info).blue());
    println!();

    let split = &summary.language_split;
    println!(
        "  {}",
        format!(
            "Python {}  JavaScript {}  other {}  in {} files",
            split.python,
            split.javascript,
            split.other,
            summary.unique_files.len()
        )
        .dimmed()
    );
}
