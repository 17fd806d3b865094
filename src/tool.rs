//! The external analysis tools and their identities.
//!
//! `ToolKind` is the registry that ties a tool to its report heading, its
//! language, its executable and its output parser. Everything that needs to
//! know "which tool is this" goes through it instead of matching strings.

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::lang::Language;

/// Install instructions per executable.
static INSTALL_HINTS: phf::Map<&'static str, &'static str> = phf_map! {
    "pylint" => "pip install pylint",
    "flake8" => "pip install flake8",
    "bandit" => "pip install bandit",
    "vulture" => "pip install vulture",
    "radon" => "pip install radon",
    "eslint" => "npm install -g eslint",
    "semgrep" => "pip install semgrep",
    "jscpd" => "npm install -g jscpd",
};

/// Supported analysis tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    Pylint,
    Flake8,
    Bandit,
    Vulture,
    RadonComplexity,
    RadonMaintainability,
    #[serde(rename = "eslint")]
    ESLint,
    Semgrep,
    Jscpd,
}

impl ToolKind {
    /// All tools in report order.
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Pylint,
        ToolKind::Flake8,
        ToolKind::Bandit,
        ToolKind::Vulture,
        ToolKind::RadonComplexity,
        ToolKind::RadonMaintainability,
        ToolKind::ESLint,
        ToolKind::Semgrep,
        ToolKind::Jscpd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Pylint => "pylint",
            ToolKind::Flake8 => "flake8",
            ToolKind::Bandit => "bandit",
            ToolKind::Vulture => "vulture",
            ToolKind::RadonComplexity => "radon-complexity",
            ToolKind::RadonMaintainability => "radon-maintainability",
            ToolKind::ESLint => "eslint",
            ToolKind::Semgrep => "semgrep",
            ToolKind::Jscpd => "jscpd",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        ToolKind::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Human-readable name used in messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolKind::Pylint => "Pylint",
            ToolKind::Flake8 => "Flake8",
            ToolKind::Bandit => "Bandit",
            ToolKind::Vulture => "Vulture",
            ToolKind::RadonComplexity => "Radon Complexity",
            ToolKind::RadonMaintainability => "Radon Maintainability",
            ToolKind::ESLint => "ESLint",
            ToolKind::Semgrep => "Semgrep",
            ToolKind::Jscpd => "jscpd",
        }
    }

    /// Report section heading. Consumers locate sections by this text, so it
    /// must not change.
    pub fn heading(&self) -> &'static str {
        match self {
            ToolKind::Pylint => "Pylint Output",
            ToolKind::Flake8 => "Flake8 Output",
            ToolKind::Bandit => "Bandit Output",
            ToolKind::Vulture => "Vulture Output",
            ToolKind::RadonComplexity => "Radon Complexity",
            ToolKind::RadonMaintainability => "Radon Maintainability",
            ToolKind::ESLint => "ESLint Output",
            ToolKind::Semgrep => "Semgrep Output",
            ToolKind::Jscpd => "jscpd Output",
        }
    }

    /// Resolve a section heading to its tool.
    pub fn from_heading(title: &str) -> Option<Self> {
        ToolKind::ALL
            .into_iter()
            .find(|t| title.contains(t.heading()))
    }

    pub fn language(&self) -> Language {
        match self {
            ToolKind::Pylint
            | ToolKind::Flake8
            | ToolKind::Bandit
            | ToolKind::Vulture
            | ToolKind::RadonComplexity
            | ToolKind::RadonMaintainability => Language::Python,
            ToolKind::ESLint | ToolKind::Semgrep | ToolKind::Jscpd => Language::JavaScript,
        }
    }

    /// Tools for a language, in report order.
    pub fn for_language(language: Language) -> impl Iterator<Item = ToolKind> {
        ToolKind::ALL
            .into_iter()
            .filter(move |t| t.language() == language)
    }

    /// Executable name.
    pub fn program(&self) -> &'static str {
        match self {
            ToolKind::Pylint => "pylint",
            ToolKind::Flake8 => "flake8",
            ToolKind::Bandit => "bandit",
            ToolKind::Vulture => "vulture",
            ToolKind::RadonComplexity | ToolKind::RadonMaintainability => "radon",
            ToolKind::ESLint => "eslint",
            ToolKind::Semgrep => "semgrep",
            ToolKind::Jscpd => "jscpd",
        }
    }

    /// How to install the tool's executable.
    pub fn install_hint(&self) -> &'static str {
        install_hint(self.program())
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install instructions for an executable name.
pub fn install_hint(program: &str) -> &'static str {
    INSTALL_HINTS
        .get(program)
        .copied()
        .unwrap_or("see the tool's documentation")
}
