//! Report files on disk: naming, saving, retention and the `latest.md` link.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Name of the link that always points at the newest report.
pub const LATEST_REPORT: &str = "latest.md";

/// `<dirname>_<YYYY-MM-DD_HHMM>_<4 hex>.md` for a report about `target`.
pub fn build_report_name(target: &Path) -> String {
    build_report_name_at(target, Utc::now(), rand::thread_rng().gen::<u16>())
}

fn build_report_name_at(target: &Path, now: DateTime<Utc>, salt: u16) -> String {
    let dirname = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "report".to_string());
    format!("{}_{}_{:04x}.md", dirname, now.format("%Y-%m-%d_%H%M"), salt)
}

/// Write `content` to `path`, creating parent directories.
pub fn save_report(content: &str, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    tracing::info!(path = %path.display(), "report saved");
    Ok(())
}

/// Delete the oldest `*.md` reports in `dir` so that at most `keep` remain.
///
/// `latest.md` is never counted or deleted. Returns the removed paths.
pub fn gc_reports(dir: &Path, keep: usize) -> io::Result<Vec<PathBuf>> {
    let mut reports: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_report = path.extension().and_then(|e| e.to_str()) == Some("md")
            && path.file_name().and_then(|n| n.to_str()) != Some(LATEST_REPORT);
        // symlink_metadata so a stray link is judged by itself, not its target.
        let meta = fs::symlink_metadata(&path)?;
        if is_report && meta.is_file() {
            reports.push((meta.modified()?, path));
        }
    }

    if reports.len() <= keep {
        return Ok(Vec::new());
    }

    // Newest first; ties broken by name so the order is stable.
    reports.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    let mut removed = Vec::new();
    for (_, path) in reports.into_iter().skip(keep) {
        fs::remove_file(&path)?;
        tracing::debug!(path = %path.display(), "removed old report");
        removed.push(path);
    }
    Ok(removed)
}

/// Point `dir/latest.md` at `report`.
#[cfg(unix)]
pub fn update_latest_report(dir: &Path, report: &Path) -> io::Result<PathBuf> {
    let link = dir.join(LATEST_REPORT);
    remove_existing(&link)?;
    // Relative target keeps the reports directory relocatable.
    let target = match report.strip_prefix(dir) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => report.to_path_buf(),
    };
    std::os::unix::fs::symlink(target, &link)?;
    Ok(link)
}

/// Copy `report` to `dir/latest.md`.
#[cfg(not(unix))]
pub fn update_latest_report(dir: &Path, report: &Path) -> io::Result<PathBuf> {
    let link = dir.join(LATEST_REPORT);
    remove_existing(&link)?;
    fs::copy(report, &link)?;
    Ok(link)
}

fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
