//! Summary statistics over a set of issues.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::parse::{Issue, Severity};

/// Issue counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

/// Issue counts per source language, judged by file extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSplit {
    pub python: usize,
    pub javascript: usize,
    pub other: usize,
}

/// Statistics for one analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_issues: usize,
    pub severity_counts: SeverityCounts,
    pub language_split: LanguageSplit,
    /// Distinct files with at least one issue, sorted.
    pub unique_files: Vec<String>,
    pub issues: Vec<Issue>,
}

impl AnalysisSummary {
    /// Compute statistics for `issues`, keeping their order.
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let mut severity_counts = SeverityCounts::default();
        let mut language_split = LanguageSplit::default();
        let mut files = BTreeSet::new();

        for issue in &issues {
            match issue.severity {
                Severity::Error => severity_counts.error += 1,
                Severity::Warning => severity_counts.warning += 1,
                Severity::Info => severity_counts.info += 1,
            }

            if issue.is_python() {
                language_split.python += 1;
            } else if issue.is_javascript() {
                language_split.javascript += 1;
            } else {
                language_split.other += 1;
            }

            files.insert(issue.file.clone());
        }

        Self {
            total_issues: issues.len(),
            severity_counts,
            language_split,
            unique_files: files.into_iter().collect(),
            issues,
        }
    }

    /// Whether any issue has error severity.
    pub fn has_errors(&self) -> bool {
        self.severity_counts.error > 0
    }
}
