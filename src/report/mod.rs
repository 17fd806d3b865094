//! Report assembly.
//!
//! The assembler runs every enabled tool of every detected language in a
//! fixed order and renders the results as one markdown document. The same
//! raw outputs are parsed on the spot, so a caller gets the issues without
//! re-reading the report.

pub mod markdown;
pub mod output;
pub mod store;

pub use markdown::ToolOutcome;

use std::path::Path;

use crate::aggregate::{GroupFailure, SectionOutcome, SectionReport};
use crate::config::Config;
use crate::lang::{Language, LanguageDetector};
use crate::parse::{is_blank, parse_output, FenceTracker, Issue, ParseContext};
use crate::runner::{ToolError, ToolExecutor, ToolRunner, ToolStatus};
use crate::tool::ToolKind;

/// Result of one tool within an analysis.
#[derive(Debug, Clone)]
pub struct ToolRun {
    pub tool: ToolKind,
    pub outcome: ToolOutcome,
    /// Issues parsed from the tool's output.
    pub issues: Vec<Issue>,
    /// Set when the output could not be parsed as a whole.
    pub parse_error: Option<String>,
}

/// Everything produced by one assembly.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: String,
    pub languages: Vec<Language>,
    pub runs: Vec<ToolRun>,
    pub group_failures: Vec<GroupFailure>,
}

impl ToolRun {
    /// The section outcome a replay of the rendered section would give.
    pub fn section_report(&self) -> SectionReport {
        let outcome = match &self.outcome {
            ToolOutcome::Failed(message) => SectionOutcome::ToolFailed(message.trim().to_string()),
            ToolOutcome::TimedOut { .. } => SectionOutcome::TimedOut,
            ToolOutcome::Output(_) if self.parse_error.is_some() => {
                SectionOutcome::Malformed(self.parse_error.clone().unwrap_or_default())
            }
            ToolOutcome::Output(stdout) if is_blank(stdout) => SectionOutcome::Empty,
            ToolOutcome::Output(_) => SectionOutcome::Parsed(self.issues.len()),
        };
        SectionReport {
            tool: self.tool,
            outcome,
        }
    }
}

impl Analysis {
    /// All issues in report order.
    pub fn issues(&self) -> Vec<Issue> {
        self.runs.iter().flat_map(|r| r.issues.iter().cloned()).collect()
    }

    pub fn sections(&self) -> Vec<SectionReport> {
        self.runs.iter().map(ToolRun::section_report).collect()
    }
}

type ToolObserver = Box<dyn Fn(ToolKind)>;

/// Builds a linting report for a path.
pub struct Assembler {
    config: Config,
    executor: Box<dyn ToolExecutor>,
    detector: LanguageDetector,
    observer: Option<ToolObserver>,
}

impl Assembler {
    /// Create an assembler that runs the real tools.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            config: config.clone(),
            executor: Box::new(ToolRunner::new(config)),
            detector: LanguageDetector::with_excluded_paths(&config.excluded_paths)?,
            observer: None,
        })
    }

    /// Replace the tool executor.
    pub fn with_executor<E: ToolExecutor + 'static>(mut self, executor: E) -> Self {
        self.executor = Box::new(executor);
        self
    }

    /// Call `f` right before each tool starts.
    pub fn on_tool_start<F: Fn(ToolKind) + 'static>(mut self, f: F) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    /// Assemble the report text for `path`.
    pub fn assemble(&self, path: &Path) -> String {
        self.run(path).report
    }

    /// Run all applicable tools against `path`.
    pub fn run(&self, path: &Path) -> Analysis {
        let generated_on = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let ctx = ParseContext::new(path);
        let languages = self.detector.detect(path);

        let mut blocks = vec![markdown::header(path, &generated_on)];
        let mut runs = Vec::new();
        let mut group_failures = Vec::new();

        if languages.is_empty() {
            tracing::info!(path = %path.display(), "no Python or JavaScript sources found");
        }

        for &language in &languages {
            blocks.push(markdown::group_heading(language));

            if let Err(e) = self.check_preconditions(language) {
                tracing::warn!(language = %language, error = %e, "skipping language group");
                blocks.push(markdown::error_line(
                    &format!("{} linters", language.display_name()),
                    &e.to_string(),
                ));
                group_failures.push(GroupFailure {
                    language,
                    message: e.to_string().trim().to_string(),
                });
                continue;
            }

            for tool in ToolKind::for_language(language).filter(|t| self.config.is_enabled(*t)) {
                let run = self.run_tool(tool, path, &ctx);
                blocks.push(markdown::tool_section(tool, &run.outcome));
                runs.push(run);
            }
        }

        blocks.push(markdown::footer());

        Analysis {
            report: blocks.join("\n\n"),
            languages,
            runs,
            group_failures,
        }
    }

    fn check_preconditions(&self, language: Language) -> Result<(), ToolError> {
        match language {
            Language::JavaScript => self.executor.check_javascript_tools(),
            Language::Python => Ok(()),
        }
    }

    fn run_tool(&self, tool: ToolKind, path: &Path, ctx: &ParseContext) -> ToolRun {
        if let Some(observer) = &self.observer {
            observer(tool);
        }

        let outcome = match self.executor.run(tool, path) {
            Ok(output) => match output.status {
                ToolStatus::Completed { exit_code } => {
                    tracing::debug!(tool = %tool, ?exit_code, bytes = output.stdout.len(), "tool finished");
                    ToolOutcome::Output(output.stdout.trim_end().to_string())
                }
                ToolStatus::TimedOut => ToolOutcome::TimedOut {
                    secs: self.executor.timeout_for(tool).as_secs(),
                },
                ToolStatus::Unavailable => {
                    tracing::warn!(tool = %tool, "tool not installed");
                    ToolOutcome::Failed(format!(
                        "{} is not installed (install with: {})",
                        tool.program(),
                        tool.install_hint()
                    ))
                }
            },
            Err(e) => {
                tracing::warn!(tool = %tool, error = %e, "tool failed");
                ToolOutcome::Failed(e.to_string())
            }
        };

        let (issues, parse_error) = match &outcome {
            ToolOutcome::Output(stdout) => match parse_output(tool, stdout, ctx) {
                Ok(issues) => (issues, None),
                Err(e) => {
                    tracing::warn!(tool = %tool, error = %e, "could not parse tool output");
                    (Vec::new(), Some(e.to_string()))
                }
            },
            _ => (Vec::new(), None),
        };

        ToolRun {
            tool,
            outcome,
            issues,
            parse_error,
        }
    }
}

/// Assemble a report for `path` with the given configuration.
pub fn assemble(path: &Path, config: &Config) -> anyhow::Result<String> {
    Ok(Assembler::new(config)?.assemble(path))
}

/// Insert an `## LLM Summary` section after the report header.
///
/// The section goes before the first `## ` heading; without one, before the
/// first `---` rule; otherwise at the end.
pub fn splice_summary(report: &str, summary: &str) -> String {
    let section = format!(
        "\n\n## {}\n\n{}\n\n---\n",
        markdown::SUMMARY_HEADING,
        contain_summary(summary.trim())
    );

    let at = report
        .find("\n\n## ")
        .or_else(|| report.find("\n---"))
        .unwrap_or(report.len());

    let mut spliced = String::with_capacity(report.len() + section.len());
    spliced.push_str(&report[..at]);
    spliced.push_str(&section);
    spliced.push_str(&report[at..]);
    spliced
}

/// Keep summary text inside its own section: `## ` headings outside fences
/// are demoted to `### `, and a fence left open is closed.
fn contain_summary(summary: &str) -> String {
    let mut tracker = FenceTracker::new();
    let mut lines: Vec<String> = summary
        .lines()
        .map(|line| {
            let outside = !tracker.is_inside();
            tracker.feed(line);
            match line.strip_prefix("## ") {
                Some(rest) if outside => format!("### {}", rest),
                _ => line.to_string(),
            }
        })
        .collect();
    if let Some(fence) = tracker.closing_fence() {
        lines.push(fence);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_detailed;
    use crate::runner::ToolOutput;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Executor that replays canned results.
    #[derive(Default)]
    struct FakeExecutor {
        outputs: HashMap<ToolKind, ToolStatus>,
        stdout: HashMap<ToolKind, String>,
        js_missing: bool,
    }

    impl FakeExecutor {
        fn with_output(mut self, tool: ToolKind, stdout: &str) -> Self {
            self.stdout.insert(tool, stdout.to_string());
            self
        }

        fn with_status(mut self, tool: ToolKind, status: ToolStatus) -> Self {
            self.outputs.insert(tool, status);
            self
        }
    }

    impl ToolExecutor for FakeExecutor {
        fn run(&self, tool: ToolKind, _target: &Path) -> Result<ToolOutput, ToolError> {
            if tool == ToolKind::Bandit && self.outputs.get(&tool).is_none() && self.stdout.get(&tool).is_none() {
                return Err(ToolError::Io(std::io::Error::new(std::io::ErrorKind::Other, "pipe closed")));
            }
            Ok(ToolOutput {
                stdout: self.stdout.get(&tool).cloned().unwrap_or_default(),
                stderr: String::new(),
                status: self
                    .outputs
                    .get(&tool)
                    .copied()
                    .unwrap_or(ToolStatus::Completed { exit_code: Some(0) }),
            })
        }

        fn check_javascript_tools(&self) -> Result<(), ToolError> {
            if self.js_missing {
                Err(crate::runner::unavailable(vec!["eslint".to_string(), "jscpd".to_string()]))
            } else {
                Ok(())
            }
        }

        fn timeout_for(&self, _tool: ToolKind) -> Duration {
            Duration::from_secs(300)
        }
    }

    fn python_project() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.py"), "import os\n").unwrap();
        temp
    }

    #[test]
    fn test_python_only_report_structure() {
        let temp = python_project();
        let fake = FakeExecutor::default()
            .with_output(ToolKind::Pylint, "app.py:12:4: E0001 syntax error\n")
            .with_output(ToolKind::Bandit, "");
        let analysis = Assembler::new(&Config::default())
            .unwrap()
            .with_executor(fake)
            .run(temp.path());

        let report = &analysis.report;
        assert!(report.starts_with("# Linting Report\n"));
        assert!(report.contains(&format!("- **Path**: `{}`", temp.path().display())));
        assert!(report.contains("## Python Linting Results"));
        assert!(!report.contains("## JavaScript Linting Results"));
        assert!(report.trim_end().ends_with("*Report generated by lintreport*"));

        let order: Vec<usize> = ToolKind::for_language(Language::Python)
            .map(|t| report.find(&format!("## {}", t.heading())).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(analysis.runs.len(), 6);
        let issues = analysis.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "E0001");
    }

    #[test]
    fn test_failing_tool_does_not_abort() {
        let temp = python_project();
        // Bandit errors by default in the fake.
        let analysis = Assembler::new(&Config::default())
            .unwrap()
            .with_executor(FakeExecutor::default())
            .run(temp.path());

        assert!(analysis
            .report
            .contains("## Bandit Output\n\n**Error running Bandit:** I/O error: pipe closed"));
        assert!(analysis.report.contains("## Vulture Output"));
        assert_eq!(analysis.runs.len(), 6);
    }

    #[test]
    fn test_timeout_and_unavailable_sections() {
        let temp = python_project();
        let fake = FakeExecutor::default()
            .with_output(ToolKind::Bandit, "")
            .with_status(ToolKind::Vulture, ToolStatus::TimedOut)
            .with_status(ToolKind::Flake8, ToolStatus::Unavailable);
        let report = Assembler::new(&Config::default())
            .unwrap()
            .with_executor(fake)
            .assemble(temp.path());

        assert!(report.contains("_Vulture timed out after 300s._"));
        assert!(report.contains("**Error running Flake8:** flake8 is not installed (install with: pip install flake8)"));
    }

    #[test]
    fn test_disabled_tools_have_no_section() {
        let temp = python_project();
        let config = Config {
            disabled_tools: vec!["vulture".to_string(), "bandit".to_string()],
            ..Config::default()
        };
        let analysis = Assembler::new(&config)
            .unwrap()
            .with_executor(FakeExecutor::default())
            .run(temp.path());

        assert!(!analysis.report.contains("## Vulture Output"));
        assert!(!analysis.report.contains("## Bandit Output"));
        assert_eq!(analysis.runs.len(), 4);
    }

    #[test]
    fn test_missing_javascript_tools_fail_group() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.js"), "var x = 1;\n").unwrap();
        let fake = FakeExecutor {
            js_missing: true,
            ..FakeExecutor::default()
        };
        let analysis = Assembler::new(&Config::default())
            .unwrap()
            .with_executor(fake)
            .run(temp.path());

        assert!(analysis.report.contains("## JavaScript Linting Results"));
        assert!(analysis.report.contains("**Error running JavaScript linters:**"));
        assert!(analysis.report.contains("npm install -g eslint"));
        assert!(!analysis.report.contains("## ESLint Output"));
        assert_eq!(analysis.group_failures.len(), 1);
        assert!(analysis.runs.is_empty());
        assert_eq!(
            aggregate_detailed(&analysis.report).group_failures,
            analysis.group_failures
        );
    }

    #[test]
    fn test_unparseable_json_output_is_recorded() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.js"), "var x = 1;\n").unwrap();
        let fake = FakeExecutor::default().with_output(ToolKind::ESLint, "Oops! Something went wrong!");
        let analysis = Assembler::new(&Config::default())
            .unwrap()
            .with_executor(fake)
            .run(temp.path());

        let eslint = analysis.runs.iter().find(|r| r.tool == ToolKind::ESLint).unwrap();
        assert!(eslint.issues.is_empty());
        assert!(eslint.parse_error.is_some());
        assert!(analysis.report.contains("Oops! Something went wrong!"));
    }

    #[test]
    fn test_no_sources_gives_header_and_footer_only() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("README.txt"), "hi").unwrap();
        let analysis = Assembler::new(&Config::default())
            .unwrap()
            .with_executor(FakeExecutor::default())
            .run(temp.path());
        assert!(analysis.languages.is_empty());
        assert!(!analysis.report.contains("## "));
        assert!(analysis.report.contains("---\n\n*Report generated by lintreport*"));
    }

    #[test]
    fn test_observer_sees_each_tool() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let temp = python_project();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        Assembler::new(&Config::default())
            .unwrap()
            .with_executor(FakeExecutor::default())
            .on_tool_start(move |t| sink.borrow_mut().push(t))
            .run(temp.path());

        assert_eq!(seen.borrow().len(), 6);
        assert_eq!(seen.borrow()[0], ToolKind::Pylint);
    }

    #[test]
    fn test_splice_before_first_section() {
        let report = "# Linting Report\n\n- **Path**: `x`\n\n## Python Linting Results\n\nbody\n\n---\n\n*Report generated by lintreport*\n";
        let spliced = splice_summary(report, "All good.");
        let summary_at = spliced.find("## LLM Summary").unwrap();
        let python_at = spliced.find("## Python Linting Results").unwrap();
        assert!(summary_at < python_at);
        assert!(spliced.contains("## LLM Summary\n\nAll good.\n\n---\n"));
        assert!(spliced.starts_with("# Linting Report\n\n- **Path**: `x`\n\n## LLM Summary"));
    }

    #[test]
    fn test_splice_before_rule_without_sections() {
        let report = "# Linting Report\n\n- **Path**: `x`\n---\n\n*footer*\n";
        let spliced = splice_summary(report, "Nothing found.");
        let summary_at = spliced.find("## LLM Summary").unwrap();
        assert!(summary_at < spliced.find("*footer*").unwrap());
    }

    #[test]
    fn test_splice_appends_at_end() {
        let spliced = splice_summary("# Linting Report", "Short.");
        assert_eq!(spliced, "# Linting Report\n\n## LLM Summary\n\nShort.\n\n---\n");
    }

    #[test]
    fn test_splice_demotes_tool_headings_in_summary() {
        let report = "# Linting Report\n\n- **Path**: `/work/repo`\n\n## Python Linting Results\n\n## Radon Complexity\n\n```\nNo output or errors occurred.\n```\n\n---\n\n*footer*\n";
        let summary = "## ESLint Output review\n\nLooks fine.\n\n## Pylint Output highlights\n\n```\napp.py:1:0: E0602: Undefined variable 'x' (undefined-variable)\n```";
        let spliced = splice_summary(report, summary);

        assert!(spliced.contains("### ESLint Output review"));
        assert!(spliced.contains("### Pylint Output highlights"));
        let before = aggregate_detailed(report);
        let after = aggregate_detailed(&spliced);
        assert_eq!(after.sections, before.sections);
        assert!(after.issues.is_empty());
    }

    #[test]
    fn test_splice_closes_open_fence_in_summary() {
        let report = "# Linting Report\n\n- **Path**: `/work/repo`\n\n## Flake8 Output\n\n```\napp.py:3:1: W291 trailing whitespace\n```\n";
        let spliced = splice_summary(report, "Example:\n````text\n## Pylint Output");

        let agg = aggregate_detailed(&spliced);
        assert_eq!(agg.sections.len(), 1);
        assert_eq!(agg.sections[0].tool, ToolKind::Flake8);
        assert_eq!(agg.issues.len(), 1);
    }
}
