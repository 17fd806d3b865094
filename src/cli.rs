//! Command-line interface for lintreport.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::aggregate_detailed;
use crate::config::Config;
use crate::report::markdown::header_path;
use crate::report::output::{self, OutputFormat};
use crate::report::{self, store, Assembler};
use crate::runner;
use crate::stats::AnalysisSummary;
use crate::summary::{self, OpenAiSummarizer};
use crate::tool::ToolKind;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Environment variable holding a GitHub token for private clones.
const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Run Python and JavaScript linters and collect their output in one report.
///
/// lintreport detects which languages a project uses, runs the matching
/// linters, writes a markdown report, and can parse any saved report back
/// into normalized issues.
#[derive(Parser)]
#[command(name = "lintreport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint a project and save a report
    Analyze(AnalyzeArgs),
    /// Parse a saved report into issues
    Issues(IssuesArgs),
    /// List supported tools and whether they are installed
    Tools(ToolsArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to analyze (file or directory)
    #[arg(required_unless_present = "repo")]
    pub path: Option<PathBuf>,

    /// Report file to write (default: a new file in the reports directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Clone this git repository and analyze it instead of PATH
    #[arg(long)]
    pub repo: Option<String>,

    /// Output format: markdown, pretty, or json
    #[arg(short, long, default_value = "markdown")]
    pub format: String,

    /// Add an LLM-generated summary to the report
    #[arg(long)]
    pub llm_summary: bool,

    /// Exit with status 1 when any issue has error severity
    #[arg(long)]
    pub fail_on_error: bool,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the issues command.
#[derive(Parser)]
pub struct IssuesArgs {
    /// Saved report file
    pub report: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Exit with status 1 when any issue has error severity
    #[arg(long)]
    pub fail_on_error: bool,
}

/// Arguments for the tools command.
#[derive(Parser)]
pub struct ToolsArgs {
    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn exit_code(summary: &AnalysisSummary, fail_on_error: bool) -> i32 {
    if fail_on_error && summary.has_errors() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

fn spinner() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let Some(format) = OutputFormat::parse(&args.format) else {
        eprintln!(
            "Error: invalid format {:?}, must be 'markdown', 'pretty', or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    };

    let config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid config: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Fail before any tool runs when the summary cannot be produced.
    let summarizer = if args.llm_summary {
        match OpenAiSummarizer::new(&config.llm) {
            Ok(s) => Some(s),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    } else {
        None
    };

    // The temp dir is held until the report is written; dropping it removes the clone.
    let (target, _clone_dir) = if let Some(url) = &args.repo {
        let temp = tempfile::Builder::new()
            .prefix("lintreport-clone-")
            .tempdir()
            .context("failed to create clone directory")?;
        let dest = temp.path().join(runner::extract_repo_name(url));
        let token = std::env::var(GITHUB_TOKEN_VAR).ok().filter(|t| !t.is_empty());

        eprintln!("Cloning {}...", url);
        if let Err(e) =
            runner::clone_repository(url, token.as_deref(), &dest, config.timeouts.clone_repo())
        {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
        (dest, Some(temp))
    } else {
        let path = args.path.as_deref().unwrap_or_else(|| Path::new("."));
        match path.canonicalize() {
            Ok(p) => (p, None),
            Err(e) => {
                eprintln!("Error: cannot access path {:?}: {}", path, e);
                return Ok(EXIT_ERROR);
            }
        }
    };

    let mut assembler = Assembler::new(&config)?;
    let progress = if format == OutputFormat::Pretty {
        let pb = spinner()?;
        let observer = pb.clone();
        assembler = assembler.on_tool_start(move |tool: ToolKind| {
            observer.set_message(format!("Running {}...", tool.display_name()));
        });
        Some(pb)
    } else {
        None
    };

    let analysis = assembler.run(&target);

    let mut report_text = analysis.report.clone();
    if let Some(summarizer) = &summarizer {
        if let Some(pb) = &progress {
            pb.set_message("Generating LLM summary...");
        }
        let text = summary::summarize_or_explain(summarizer, &report_text);
        report_text = report::splice_summary(&report_text, &text);
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let report_file = save(&report_text, &target, args.output.as_deref(), &config)?;

    let summary = AnalysisSummary::from_issues(analysis.issues());
    let sections = analysis.sections();
    let display_path = match &args.repo {
        Some(url) => url.clone(),
        None => target.display().to_string(),
    };

    match format {
        OutputFormat::Markdown => {
            println!("{}", report_text);
            eprintln!("Report saved to: {}", report_file.display());
        }
        OutputFormat::Pretty => {
            output::write_pretty(
                Some(&display_path),
                Some(&report_file),
                &summary,
                &sections,
                &analysis.group_failures,
            );
        }
        OutputFormat::Json => {
            output::write_json(
                Some(&display_path),
                Some(&report_file),
                &summary,
                &sections,
                &analysis.group_failures,
            )?;
        }
    }

    Ok(exit_code(&summary, args.fail_on_error))
}

/// Write the report and maintain the reports directory.
fn save(
    report_text: &str,
    target: &Path,
    explicit: Option<&Path>,
    config: &Config,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        store::save_report(report_text, path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        return Ok(path.to_path_buf());
    }

    let dir = &config.reports_dir;
    let path = dir.join(store::build_report_name(target));
    store::save_report(report_text, &path)
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    if let Err(e) = store::update_latest_report(dir, &path) {
        tracing::warn!(error = %e, "could not update latest report link");
    }
    match store::gc_reports(dir, config.keep_reports) {
        Ok(removed) if !removed.is_empty() => {
            tracing::info!(count = removed.len(), "removed old reports");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "could not clean up old reports"),
    }

    Ok(path)
}

/// Run the issues command.
pub fn run_issues(args: &IssuesArgs) -> anyhow::Result<i32> {
    let format = match OutputFormat::parse(&args.format) {
        Some(f @ (OutputFormat::Pretty | OutputFormat::Json)) => f,
        _ => {
            eprintln!(
                "Error: invalid format {:?}, must be 'pretty' or 'json'",
                args.format
            );
            return Ok(EXIT_ERROR);
        }
    };

    let report_text = match std::fs::read_to_string(&args.report) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", args.report.display(), e);
            return Ok(EXIT_ERROR);
        }
    };

    let aggregation = aggregate_detailed(&report_text);
    let summary = AnalysisSummary::from_issues(aggregation.issues);
    let path = header_path(&report_text);
    let report_file = Some(args.report.as_path());

    match format {
        OutputFormat::Json => output::write_json(
            path,
            report_file,
            &summary,
            &aggregation.sections,
            &aggregation.group_failures,
        )?,
        _ => output::write_pretty(
            path,
            report_file,
            &summary,
            &aggregation.sections,
            &aggregation.group_failures,
        ),
    }

    Ok(exit_code(&summary, args.fail_on_error))
}

/// Run the tools command.
pub fn run_tools(args: &ToolsArgs) -> anyhow::Result<i32> {
    let config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid config: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let timeout = config.timeouts.version_check();

    println!("Supported tools:");
    println!();

    for tool in ToolKind::ALL {
        let status = if runner::is_available(tool.program(), timeout) {
            "installed".green()
        } else {
            format!("missing ({})", tool.install_hint()).red()
        };
        let name = if config.is_enabled(tool) {
            tool.as_str().to_string()
        } else {
            format!("{} (disabled)", tool.as_str())
        };
        println!(
            "  {:<32} {:<12} {}",
            name,
            tool.language().display_name(),
            status
        );
    }

    Ok(EXIT_SUCCESS)
}
