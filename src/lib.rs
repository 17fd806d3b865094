//! lintreport - run Python and JavaScript linters and collect one report.
//!
//! lintreport detects which languages a project contains, runs the linters
//! for each language, and renders their raw output as a markdown report.
//! A saved report can be parsed back into normalized issues.
//!
//! # Architecture
//!
//! - `lang`: language detection over a directory tree
//! - `tool`: the tool registry (headings, executables, languages)
//! - `runner`: subprocess execution with timeouts, repository cloning
//! - `report`: report assembly, markdown rendering, storage, terminal output
//! - `parse`: one parser per tool output format
//! - `aggregate`: splitting a saved report into sections and parsing them
//! - `stats`: summary statistics over issues
//! - `summary`: optional LLM summary of a report
//! - `config`: YAML configuration
//!
//! # Adding a New Tool
//!
//! Add a `ToolKind` variant with its heading and language, give the runner
//! its command line, and add a parser under `src/parse/`.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod lang;
pub mod parse;
pub mod report;
pub mod runner;
pub mod stats;
pub mod summary;
pub mod tool;

pub use aggregate::{aggregate, aggregate_detailed, Aggregation, GroupFailure, SectionOutcome};
pub use config::Config;
pub use lang::{Language, LanguageDetector};
pub use parse::{Issue, ParseError, Severity};
pub use report::{assemble, splice_summary, Analysis, Assembler};
pub use runner::{ToolError, ToolExecutor, ToolOutput, ToolRunner, ToolStatus};
pub use stats::AnalysisSummary;
pub use summary::{OpenAiSummarizer, Summarizer, SummaryError};
pub use tool::ToolKind;
