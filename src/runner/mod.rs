//! Invocation of the external analysis tools.
//!
//! Every tool runs as a subprocess with a timeout. Missing binaries,
//! timeouts and non-zero exit codes are reported through [`ToolStatus`],
//! never as errors; [`ToolError`] is reserved for things that prevent a
//! stage from running at all.

mod clone;
mod process;

pub use clone::{authenticated_url, clone_repository, extract_repo_name};
pub use process::run_command;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, Timeouts};
use crate::tool::{install_hint, ToolKind};

/// Executables that must answer `--version` before JavaScript analysis runs.
pub const JS_REQUIRED_TOOLS: [&str; 2] = ["eslint", "jscpd"];

/// File name jscpd writes into its output directory.
const JSCPD_REPORT_FILE: &str = "jscpd-report.json";

/// Errors that prevent a tool or a stage from running.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("missing required tools: {}. Install them first: {hint}", .tools.join(", "))]
    Unavailable { tools: Vec<String>, hint: String },
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },
    #[error("{program} exited with status {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// How a tool run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// The process exited on its own. `exit_code` is `None` when it was
    /// terminated by a signal.
    Completed { exit_code: Option<i32> },
    /// The process was killed after exceeding its timeout.
    TimedOut,
    /// The executable could not be found.
    Unavailable,
}

/// Captured result of one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ToolStatus,
}

impl ToolOutput {
    pub(crate) fn unavailable() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            status: ToolStatus::Unavailable,
        }
    }

    pub(crate) fn timed_out() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            status: ToolStatus::TimedOut,
        }
    }

    pub fn completed(&self) -> bool {
        matches!(self.status, ToolStatus::Completed { .. })
    }
}

/// Deletes a tool artifact when dropped, whether or not it was read.
struct ArtifactGuard {
    path: PathBuf,
}

impl ArtifactGuard {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the artifact. A missing artifact reads as empty.
    fn read(&self) -> io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Runs tools on behalf of the report assembler.
pub trait ToolExecutor {
    /// Run one tool against `target`.
    fn run(&self, tool: ToolKind, target: &Path) -> Result<ToolOutput, ToolError>;

    /// Fail when a JavaScript tool is missing.
    fn check_javascript_tools(&self) -> Result<(), ToolError>;

    /// Timeout applied to `tool`.
    fn timeout_for(&self, tool: ToolKind) -> Duration;
}

/// Builds and runs tool commands according to a [`Config`].
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeouts: Timeouts,
    radon_min_grade: String,
    eslint_config: Option<PathBuf>,
}

impl ToolRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            timeouts: config.timeouts.clone(),
            radon_min_grade: config.radon_min_grade.clone(),
            eslint_config: config.eslint_config.clone(),
        }
    }

    /// Arguments passed to `tool.program()` when analyzing `target`.
    ///
    /// The target is named relative to [`working_dir`]. `output_dir` is only
    /// used by jscpd, which writes its JSON report to a directory instead of
    /// stdout.
    pub fn args(&self, tool: ToolKind, target: &Path, output_dir: Option<&Path>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        match tool {
            ToolKind::Pylint => {
                args.push("--msg-template={path}:{line}:{column}: {msg_id}: {msg} ({symbol})".into());
                args.push("--score=n".into());
                if target.is_dir() {
                    args.push("--recursive=y".into());
                }
            }
            ToolKind::Flake8 => {}
            ToolKind::Bandit => args.push("-r".into()),
            ToolKind::Vulture => {}
            ToolKind::RadonComplexity => {
                args.extend(["cc", "-s", "-n"].map(OsString::from));
                args.push(self.radon_min_grade.clone().into());
            }
            ToolKind::RadonMaintainability => args.extend(["mi", "-s"].map(OsString::from)),
            ToolKind::ESLint => {
                if let Some(cfg) = &self.eslint_config {
                    args.push("--config".into());
                    args.push(cfg.clone().into_os_string());
                }
                args.extend(["--format", "json"].map(OsString::from));
            }
            ToolKind::Semgrep => args.extend(["--config=auto", "--json"].map(OsString::from)),
            ToolKind::Jscpd => {
                args.extend(["--silent", "--reporters", "json"].map(OsString::from));
                if let Some(dir) = output_dir {
                    args.push("--output".into());
                    args.push(dir.as_os_str().to_os_string());
                }
            }
        }
        args.push(target_arg(target).as_os_str().to_os_string());
        args
    }

    /// jscpd reports through a file. The file is read and removed right
    /// away; the surrounding temporary directory goes when this returns.
    fn run_jscpd(&self, target: &Path) -> Result<ToolOutput, ToolError> {
        let out_dir = tempfile::Builder::new().prefix("lintreport-jscpd-").tempdir()?;
        let artifact = ArtifactGuard::new(out_dir.path().join(JSCPD_REPORT_FILE));

        let args = self.args(ToolKind::Jscpd, target, Some(out_dir.path()));
        let mut output = run_command(
            ToolKind::Jscpd.program(),
            args,
            working_dir(target),
            self.timeout_for(ToolKind::Jscpd),
        )?;
        if !output.completed() {
            return Ok(output);
        }

        output.stdout = artifact.read()?;
        Ok(output)
    }
}

impl ToolExecutor for ToolRunner {
    fn timeout_for(&self, tool: ToolKind) -> Duration {
        match tool {
            ToolKind::Jscpd => self.timeouts.jscpd(),
            _ => self.timeouts.tool(),
        }
    }

    fn run(&self, tool: ToolKind, target: &Path) -> Result<ToolOutput, ToolError> {
        tracing::debug!(tool = %tool, target = %target.display(), "running tool");
        if tool == ToolKind::Jscpd {
            return self.run_jscpd(target);
        }
        run_command(
            tool.program(),
            self.args(tool, target, None),
            working_dir(target),
            self.timeout_for(tool),
        )
    }

    fn check_javascript_tools(&self) -> Result<(), ToolError> {
        let missing = missing_tools(&JS_REQUIRED_TOOLS, self.timeouts.version_check());
        if missing.is_empty() {
            return Ok(());
        }
        Err(unavailable(missing))
    }
}

/// Directory a tool runs in when analyzing `target`.
///
/// Some tools print paths relative to their working directory rather than
/// to the path they were given, so every tool starts in the analyzed root:
/// the target itself for a directory, its parent for a single file.
pub fn working_dir(target: &Path) -> Option<&Path> {
    if target.is_dir() {
        return Some(target);
    }
    target.parent().filter(|p| !p.as_os_str().is_empty())
}

/// How `target` is named on a tool's command line, relative to [`working_dir`].
fn target_arg(target: &Path) -> &Path {
    if target.is_dir() {
        return Path::new(".");
    }
    match (working_dir(target), target.file_name()) {
        (Some(_), Some(name)) => Path::new(name),
        _ => target,
    }
}

/// Whether `program` is on PATH and answers `--version` within `timeout`.
pub fn is_available(program: &str, timeout: Duration) -> bool {
    if which::which(program).is_err() {
        return false;
    }
    matches!(
        run_command(program, ["--version"], None, timeout),
        Ok(ToolOutput {
            status: ToolStatus::Completed { .. },
            ..
        })
    )
}

/// The subset of `programs` that is not available.
pub fn missing_tools(programs: &[&str], timeout: Duration) -> Vec<String> {
    programs
        .iter()
        .filter(|p| !is_available(p, timeout))
        .map(|p| p.to_string())
        .collect()
}

/// Build the error reported when `tools` are missing.
pub fn unavailable(tools: Vec<String>) -> ToolError {
    let hint = tools
        .iter()
        .map(|t| install_hint(t))
        .collect::<Vec<_>>()
        .join("; ");
    ToolError::Unavailable { tools, hint }
}
