//! Integration tests: issues parsed while a report is assembled must match
//! the issues parsed back from the saved report.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use lintreport::aggregate::{aggregate, aggregate_detailed, SectionOutcome};
use lintreport::report::store;
use lintreport::{
    splice_summary, AnalysisSummary, Assembler, Config, Severity, ToolError, ToolExecutor,
    ToolKind, ToolOutput, ToolStatus,
};
use tempfile::TempDir;

/// Executor that replays canned stdout per tool.
struct CannedExecutor {
    stdout: HashMap<ToolKind, String>,
    timed_out: Vec<ToolKind>,
}

impl ToolExecutor for CannedExecutor {
    fn run(&self, tool: ToolKind, _target: &Path) -> Result<ToolOutput, ToolError> {
        let status = if self.timed_out.contains(&tool) {
            ToolStatus::TimedOut
        } else {
            ToolStatus::Completed { exit_code: Some(1) }
        };
        Ok(ToolOutput {
            stdout: self.stdout.get(&tool).cloned().unwrap_or_default(),
            stderr: String::new(),
            status,
        })
    }

    fn check_javascript_tools(&self) -> Result<(), ToolError> {
        Ok(())
    }

    fn timeout_for(&self, _tool: ToolKind) -> Duration {
        Duration::from_secs(300)
    }
}

fn mixed_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("app.py"), "import os\nimport subprocess\n").unwrap();
    std::fs::create_dir(temp.path().join("web")).unwrap();
    std::fs::write(temp.path().join("web").join("index.js"), "var x = 1;\n").unwrap();
    temp
}

fn canned_outputs(root: &Path) -> HashMap<ToolKind, String> {
    let root = root.display();
    let mut m = HashMap::new();
    m.insert(
        ToolKind::Pylint,
        format!(
            "************* Module app\n\
             {root}/app.py:1:0: W0611: Unused import os (unused-import)\n\
             {root}/app.py:9:4: E1101: Module 'os' has no 'nope' member (no-member)\n"
        ),
    );
    m.insert(
        ToolKind::Flake8,
        "./app.py:1:1: F401 'os' imported but unused\n## not a heading\n./app.py:2:80: E501 line too long (88 > 79 characters)\n"
            .to_string(),
    );
    m.insert(
        ToolKind::Bandit,
        ">> Issue: [B404:blacklist] Consider possible security implications associated with the subprocess module.\n   \
         Severity: Low   Confidence: High\n   \
         Location: ./app.py:2:0\n\
         1\timport os\n\
         2\timport subprocess\n\
         \n\
         --------------------------------------------------\n"
            .to_string(),
    );
    m.insert(
        ToolKind::Vulture,
        "app.py:1: unused import 'os' (90% confidence)\n".to_string(),
    );
    m.insert(
        ToolKind::RadonComplexity,
        "app.py\n    F 12:0 handle - D (23)\n    M 40:4 Parser.parse - C (11)\n".to_string(),
    );
    m.insert(ToolKind::RadonMaintainability, "app.py - B (72.31)\n".to_string());
    m.insert(
        ToolKind::ESLint,
        format!(
            r#"[{{"filePath": "{root}/web/index.js", "messages": [
                {{"line": 1, "severity": 2, "ruleId": "no-var", "message": "Unexpected var, use let or const instead.", "fix": {{"range": [0, 3], "text": "let"}}}},
                {{"line": 1, "severity": 1, "ruleId": null, "message": "Markdown ``` fence in a message"}}
            ]}}]"#
        ),
    );
    m.insert(
        ToolKind::Semgrep,
        format!(
            r#"{{"results": [{{"check_id": "javascript.lang.security.eval", "path": "{root}/web/index.js",
                "start": {{"line": 1}},
                "extra": {{"message": "eval detected", "severity": "WARNING", "metadata": {{"confidence": "HIGH"}}}}}}],
              "errors": []}}"#
        ),
    );
    m
}

fn assemble_mixed() -> (TempDir, lintreport::Analysis) {
    let temp = mixed_project();
    let executor = CannedExecutor {
        stdout: canned_outputs(temp.path()),
        timed_out: vec![ToolKind::Jscpd],
    };
    let analysis = Assembler::new(&Config::default())
        .unwrap()
        .with_executor(executor)
        .run(temp.path());
    (temp, analysis)
}

#[test]
fn test_replay_matches_live_parse() {
    let (_temp, analysis) = assemble_mixed();

    let live = analysis.issues();
    let replayed = aggregate(&analysis.report);
    assert_eq!(live, replayed);

    // 2 pylint, 2 flake8, 1 bandit, 1 vulture, 2 radon cc, 1 radon mi,
    // 2 eslint, 1 semgrep.
    assert_eq!(live.len(), 12);
}

#[test]
fn test_replay_section_outcomes_match_live() {
    let (_temp, analysis) = assemble_mixed();
    let replayed = aggregate_detailed(&analysis.report);
    assert_eq!(analysis.sections(), replayed.sections);

    let jscpd = replayed
        .sections
        .iter()
        .find(|s| s.tool == ToolKind::Jscpd)
        .unwrap();
    assert_eq!(jscpd.outcome, SectionOutcome::TimedOut);
}

#[test]
fn test_paths_are_relative_to_analyzed_root() {
    let (_temp, analysis) = assemble_mixed();
    let issues = aggregate(&analysis.report);

    assert!(issues.iter().all(|i| !i.file.starts_with('/')));
    let eslint: Vec<_> = issues.iter().filter(|i| i.rule == "no-var").collect();
    assert_eq!(eslint.len(), 1);
    assert_eq!(eslint[0].file, "web/index.js");
    assert_eq!(eslint[0].severity, Severity::Error);
    assert_eq!(eslint[0].fix, "let");
}

#[test]
fn test_working_directory_relative_paths_match_absolute_ones() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    std::fs::create_dir(&src).unwrap();
    std::fs::write(src.join("app.py"), "import os\n").unwrap();

    let mut stdout = HashMap::new();
    // Pylint and Vulture print paths relative to their working directory,
    // the others echo the path they were given.
    stdout.insert(ToolKind::Pylint, "app.py:1:0: W0611: Unused import os (unused-import)\n".to_string());
    stdout.insert(ToolKind::Vulture, "app.py:1: unused import 'os' (90% confidence)\n".to_string());
    stdout.insert(ToolKind::Flake8, "./app.py:1:1: F401 'os' imported but unused\n".to_string());
    stdout.insert(
        ToolKind::RadonMaintainability,
        format!("{}/app.py - B (72.31)\n", src.display()),
    );
    let executor = CannedExecutor {
        stdout,
        timed_out: Vec::new(),
    };
    let analysis = Assembler::new(&Config::default())
        .unwrap()
        .with_executor(executor)
        .run(&src);

    let live = analysis.issues();
    assert_eq!(live.len(), 4);
    assert_eq!(aggregate(&analysis.report), live);

    let summary = AnalysisSummary::from_issues(live);
    assert_eq!(summary.unique_files, vec!["app.py"]);
}

#[test]
fn test_summary_splice_does_not_change_issues() {
    let (_temp, analysis) = assemble_mixed();
    let spliced = splice_summary(
        &analysis.report,
        "Two errors need attention.\n\n## Pylint Output\n\napp.py:1:1: E0001 fake",
    );

    assert!(spliced.contains("## LLM Summary"));
    assert!(spliced.contains("### Pylint Output"));
    let before = aggregate_detailed(&analysis.report);
    let after = aggregate_detailed(&spliced);
    assert_eq!(before.issues, after.issues);
    assert_eq!(before.sections, after.sections);
}

#[test]
fn test_saved_report_replays_identically() {
    let (_temp, analysis) = assemble_mixed();
    let out = TempDir::new().unwrap();
    let path = out.path().join("report.md");
    store::save_report(&analysis.report, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(aggregate(&text), analysis.issues());
    assert_eq!(aggregate(&text), aggregate(&text));
}

#[test]
fn test_fixture_report() {
    let text = std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/sample_report.md"),
    )
    .unwrap();
    let agg = aggregate_detailed(&text);

    assert_eq!(agg.issues.len(), 5);
    assert!(agg
        .issues
        .iter()
        .all(|i| i.file == "app.py" || i.file == "web/index.js"));
    assert!(agg
        .sections
        .iter()
        .any(|s| matches!(s.outcome, SectionOutcome::ToolFailed(_))));
}
