//! Language detection by file extension.
//!
//! Decides which tool sets apply to a file or directory. A directory matches
//! a language when at least one file with a matching extension exists
//! anywhere below it; the walk stops at the first match.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "venv", "__pycache__", "site-packages"];

/// Languages with a tool set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    /// All languages in report order.
    pub const ALL: [Language; 2] = [Language::Python, Language::JavaScript];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
        }
    }

    /// Human-readable name used in report headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
        }
    }

    /// Group heading for this language's sections in the report.
    pub fn heading(&self) -> &'static str {
        match self {
            Language::Python => "Python Linting Results",
            Language::JavaScript => "JavaScript Linting Results",
        }
    }

    /// File extensions associated with this language.
    pub fn extensions(&self) -> &[&'static str] {
        match self {
            Language::Python => &["py"],
            Language::JavaScript => &["js", "jsx"],
        }
    }

    /// Resolve a report group heading back to its language.
    pub fn from_heading(heading: &str) -> Option<Self> {
        let heading = heading.trim();
        Language::ALL.into_iter().find(|lang| lang.heading() == heading)
    }

    /// Whether `path` has one of this language's extensions.
    pub fn matches_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions().contains(&ext))
            .unwrap_or(false)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scans paths for source files of the supported languages.
#[derive(Debug, Default)]
pub struct LanguageDetector {
    excluded: Option<GlobSet>,
}

impl LanguageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a detector that also skips paths matching the given globs.
    pub fn with_excluded_paths(patterns: &[String]) -> anyhow::Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid excluded path {:?}: {}", pattern, e))?;
            builder.add(glob);
        }

        Ok(Self {
            excluded: Some(builder.build()?),
        })
    }

    /// Whether `path` is, or contains, a source file of `language`.
    pub fn has_language(&self, path: &Path, language: Language) -> bool {
        if path.is_file() {
            return language.matches_file(path);
        }
        if !path.is_dir() {
            return false;
        }

        WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| self.should_descend(e))
            .filter_map(|e| e.ok())
            .any(|e| e.file_type().is_file() && language.matches_file(e.path()))
    }

    /// Languages present under `path`, in report order.
    pub fn detect(&self, path: &Path) -> Vec<Language> {
        let found: Vec<Language> = Language::ALL
            .into_iter()
            .filter(|&lang| self.has_language(path, lang))
            .collect();
        tracing::debug!(path = %path.display(), languages = ?found, "detected languages");
        found
    }

    fn should_descend(&self, entry: &DirEntry) -> bool {
        // The root is always scanned, even when it is a hidden temp directory.
        if entry.depth() == 0 {
            return true;
        }

        if let Some(excluded) = &self.excluded {
            if excluded.is_match(entry.path()) {
                return false;
            }
        }

        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
                return false;
            }
        }
        true
    }
}

/// Whether `path` is, or contains, Python source.
pub fn has_python(path: &Path) -> bool {
    LanguageDetector::new().has_language(path, Language::Python)
}

/// Whether `path` is, or contains, JavaScript source.
pub fn has_javascript(path: &Path) -> bool {
    LanguageDetector::new().has_language(path, Language::JavaScript)
}
