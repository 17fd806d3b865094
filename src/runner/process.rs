//! Subprocess execution with a hard timeout.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use super::{ToolError, ToolOutput, ToolStatus};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Extension trait to add `wait_timeout` to `Child`.
trait ChildExt {
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            if start.elapsed() >= timeout {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Drain a pipe on a separate thread so the child never blocks on a full buffer.
///
/// The buffer arrives on the returned channel once the pipe closes. A pipe
/// inherited by a background grandchild may stay open long after the child
/// exits, so callers wait on the channel with a deadline.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a drained pipe until `deadline`, plus a short grace so output of
/// a child that exited right at the deadline is not lost.
fn collect(rx: &Receiver<Vec<u8>>, deadline: Instant) -> Option<Vec<u8>> {
    let remaining = deadline.saturating_duration_since(Instant::now()).max(DRAIN_GRACE);
    match rx.recv_timeout(remaining) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Run `program` with `args` in `cwd` and collect its stdout.
///
/// A missing executable yields [`ToolStatus::Unavailable`]. Running past
/// `timeout` yields [`ToolStatus::TimedOut`] with empty stdout; this covers
/// both a child that is still running, which is killed, and output pipes
/// still held open by something the child left behind. A non-zero exit code
/// is reported but is not an error.
pub fn run_command<I, S>(
    program: &str,
    args: I,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let deadline = Instant::now() + timeout;
    let spawned = command.spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(program, "executable not found");
            return Ok(ToolOutput::unavailable());
        }
        Err(source) => {
            return Err(ToolError::Spawn {
                program: program.to_string(),
                source,
            })
        }
    };

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            tracing::warn!(program, timeout_secs = timeout.as_secs(), "tool timed out, killing it");
            let _ = child.kill();
            let _ = child.wait();
            // Grandchildren may still hold the pipes open, so the reader
            // threads are detached instead of waited on.
            return Ok(ToolOutput::timed_out());
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ToolError::Io(e));
        }
    };

    let (Some(stdout), Some(stderr)) = (collect(&stdout, deadline), collect(&stderr, deadline)) else {
        tracing::warn!(
            program,
            timeout_secs = timeout.as_secs(),
            "tool exited but its output stayed open past the timeout"
        );
        return Ok(ToolOutput::timed_out());
    };

    let stderr = String::from_utf8_lossy(&stderr).into_owned();
    if !stderr.trim().is_empty() {
        tracing::debug!(program, stderr = %stderr.trim_end(), "tool stderr");
    }

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr,
        status: ToolStatus::Completed {
            exit_code: status.code(),
        },
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let out = run_command("sh", ["-c", "echo hello; echo noise >&2"], None, Duration::from_secs(10)).unwrap();
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.status, ToolStatus::Completed { exit_code: Some(0) });
    }

    #[test]
    fn test_nonzero_exit_is_not_error() {
        let out = run_command("sh", ["-c", "echo found; exit 4"], None, Duration::from_secs(10)).unwrap();
        assert_eq!(out.stdout, "found\n");
        assert_eq!(out.status, ToolStatus::Completed { exit_code: Some(4) });
    }

    #[test]
    fn test_missing_executable() {
        let out = run_command(
            "lintreport-definitely-missing-binary",
            ["--version"],
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(out.status, ToolStatus::Unavailable);
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let out = run_command("sh", ["-c", "echo early; exec sleep 30"], None, Duration::from_millis(300)).unwrap();
        assert_eq!(out.status, ToolStatus::TimedOut);
        assert!(out.stdout.is_empty());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_large_output_does_not_block() {
        let out = run_command(
            "sh",
            ["-c", "i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done"],
            None,
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(out.stdout.lines().count(), 20000);
    }

    #[test]
    fn test_background_child_holding_pipe_does_not_outlive_timeout() {
        let start = Instant::now();
        let out = run_command("sh", ["-c", "sleep 8 & echo hi"], None, Duration::from_secs(1)).unwrap();
        assert_eq!(out.status, ToolStatus::TimedOut);
        assert!(out.stdout.is_empty());
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_runs_in_working_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();
        let out = run_command("sh", ["-c", "ls"], Some(temp.path()), Duration::from_secs(10)).unwrap();
        assert_eq!(out.stdout, "marker.txt\n");
    }
}
