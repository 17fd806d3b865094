//! Core types for normalized findings.

use serde::{Deserialize, Serialize};

/// Fix text used when a tool does not suggest a remedy.
pub const NO_FIX: &str = "No automatic fix available";

/// Severity levels for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Classify a lint message code by its leading letter.
    ///
    /// `E...` codes are errors, `W...` codes are warnings, everything else
    /// (conventions, refactors, pyflakes `F`, mccabe `C`) is informational.
    pub fn from_code(code: &str) -> Self {
        match code.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('E') => Severity::Error,
            Some('W') => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// A single normalized finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub file: String,
    /// 0 when the finding has no specific line.
    pub line: u64,
    pub severity: Severity,
    pub rule: String,
    pub description: String,
    pub fix: String,
}

impl Issue {
    /// Whether the file extension belongs to a Python source file.
    pub fn is_python(&self) -> bool {
        self.file.ends_with(".py")
    }

    /// Whether the file extension belongs to a JavaScript source file.
    pub fn is_javascript(&self) -> bool {
        self.file.ends_with(".js") || self.file.ends_with(".jsx")
    }
}
