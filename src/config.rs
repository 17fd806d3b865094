//! Configuration for lintreport.
//!
//! Settings come from a YAML file (explicit, discovered in the working
//! directory, or in the user config directory), then environment overrides.
//! Every field has a default, so an empty file is a valid configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tool::ToolKind;

/// Config file names searched for in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["lintreport.yaml", ".lintreport.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory where generated reports are stored.
    pub reports_dir: PathBuf,
    /// Number of reports kept by garbage collection.
    pub keep_reports: usize,
    /// Glob patterns for paths skipped by language detection (e.g. "**/docs/**").
    pub excluded_paths: Vec<String>,
    /// Tools that never run, by name (`pylint`, `radon-complexity`, ...).
    pub disabled_tools: Vec<String>,
    /// Lowest complexity grade radon reports.
    pub radon_min_grade: String,
    /// ESLint config file passed with `--config`.
    pub eslint_config: Option<PathBuf>,
    pub timeouts: Timeouts,
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("Reports"),
            keep_reports: 10,
            excluded_paths: Vec::new(),
            disabled_tools: Vec::new(),
            radon_min_grade: "C".to_string(),
            eslint_config: None,
            timeouts: Timeouts::default(),
            llm: LlmConfig::default(),
        }
    }
}

/// Subprocess time budgets, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    pub tool_secs: u64,
    pub jscpd_secs: u64,
    pub version_check_secs: u64,
    pub clone_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            tool_secs: 300,
            jscpd_secs: 30,
            version_check_secs: 5,
            clone_secs: 300,
        }
    }
}

impl Timeouts {
    pub fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }

    pub fn jscpd(&self) -> Duration {
        Duration::from_secs(self.jscpd_secs)
    }

    pub fn version_check(&self) -> Duration {
        Duration::from_secs(self.version_check_secs)
    }

    pub fn clone_repo(&self) -> Duration {
        Duration::from_secs(self.clone_secs)
    }
}

/// OpenAI-compatible summarization endpoint.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load the effective configuration.
    ///
    /// An explicit path must exist. Otherwise the first discovered file is
    /// used, falling back to defaults. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let source = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover(),
        };

        let mut config = match &source {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::parse_file(path)
                    .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LINTREPORT_REPORTS_DIR") {
            self.reports_dir = PathBuf::from(dir);
        }
        if let Some(keep) = lookup("LINTREPORT_KEEP_REPORTS") {
            self.keep_reports = keep
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid LINTREPORT_KEEP_REPORTS {:?}: {}", keep, e))?;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        Ok(())
    }

    /// Whether `tool` runs.
    pub fn is_enabled(&self, tool: ToolKind) -> bool {
        !self.disabled_tools.iter().any(|t| t == tool.as_str())
    }

    /// Validate the configuration for correctness.
    pub fn validate(&self) -> anyhow::Result<()> {
        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
        }

        for name in &self.disabled_tools {
            if ToolKind::parse(name).is_none() {
                anyhow::bail!("unknown tool {:?} in disabled_tools", name);
            }
        }

        if !matches!(self.radon_min_grade.as_str(), "A" | "B" | "C" | "D" | "E" | "F") {
            anyhow::bail!(
                "invalid radon_min_grade {:?}, must be one of A-F",
                self.radon_min_grade
            );
        }

        if self.keep_reports == 0 {
            anyhow::bail!("keep_reports must be at least 1");
        }

        let t = &self.timeouts;
        if t.tool_secs == 0 || t.jscpd_secs == 0 || t.version_check_secs == 0 || t.clone_secs == 0 {
            anyhow::bail!("timeouts must be greater than zero");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be between 0 and 2");
        }

        Ok(())
    }
}

/// Find a config file in the working directory, then in the user config directory.
fn discover() -> Option<PathBuf> {
    for name in DEFAULT_CONFIG_NAMES {
        let path = PathBuf::from(name);
        if path.exists() {
            return Some(path);
        }
    }

    ProjectDirs::from("", "", "lintreport")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
        .filter(|path| path.exists())
}
