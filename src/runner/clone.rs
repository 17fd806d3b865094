//! Shallow clones of remote repositories.

use lazy_static::lazy_static;
use regex::Regex;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use super::{run_command, unavailable, ToolError, ToolStatus};

const GITHUB_PREFIX: &str = "https://github.com/";

lazy_static! {
    static ref GITHUB_REPO: Regex = Regex::new(r"github\.com[/:]([^/]+)/([^/.]+)").unwrap();
}

/// `owner_repo` for a GitHub URL, `unknown_repo` for anything else.
pub fn extract_repo_name(url: &str) -> String {
    GITHUB_REPO
        .captures(url)
        .map(|c| format!("{}_{}", &c[1], &c[2]))
        .unwrap_or_else(|| "unknown_repo".to_string())
}

/// Embed `token` into a `https://github.com/` URL. Other URLs are returned unchanged.
pub fn authenticated_url(url: &str, token: Option<&str>) -> String {
    match (token, url.strip_prefix(GITHUB_PREFIX)) {
        (Some(token), Some(rest)) if !token.is_empty() => {
            format!("https://x-access-token:{}@github.com/{}", token, rest)
        }
        _ => url.to_string(),
    }
}

/// `git clone --depth 1 <url> <dest>`.
pub fn clone_repository(
    url: &str,
    token: Option<&str>,
    dest: &Path,
    timeout: Duration,
) -> Result<(), ToolError> {
    tracing::info!(url, dest = %dest.display(), "cloning repository");

    let args: Vec<OsString> = vec![
        "clone".into(),
        "--depth".into(),
        "1".into(),
        authenticated_url(url, token).into(),
        dest.as_os_str().to_os_string(),
    ];

    let output = run_command("git", args, None, timeout)?;
    match output.status {
        ToolStatus::Completed { exit_code: Some(0) } => Ok(()),
        ToolStatus::Completed { exit_code } => Err(ToolError::Failed {
            program: "git clone".to_string(),
            code: exit_code.unwrap_or(-1),
            stderr: redact(output.stderr.trim(), token),
        }),
        ToolStatus::TimedOut => Err(ToolError::TimedOut {
            program: "git clone".to_string(),
            secs: timeout.as_secs(),
        }),
        ToolStatus::Unavailable => Err(unavailable(vec!["git".to_string()])),
    }
}

fn redact(text: &str, token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() => text.replace(token, "***"),
        _ => text.to_string(),
    }
}
