//! LLM summaries of finished reports.

mod openai;

pub use openai::OpenAiSummarizer;

use thiserror::Error;

/// Errors that can occur while producing a summary.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("summary service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Produces a prose summary of a linting report.
pub trait Summarizer {
    fn summarize(&self, report: &str) -> Result<String, SummaryError>;
}

/// Summarize `report`, turning a failed request into summary text so the
/// report can still be saved.
pub fn summarize_or_explain(summarizer: &dyn Summarizer, report: &str) -> String {
    match summarizer.summarize(report) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(error = %e, "LLM summary failed");
            format!("Error generating LLM summary: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, u16>);

    impl Summarizer for Fixed {
        fn summarize(&self, _report: &str) -> Result<String, SummaryError> {
            match self.0 {
                Ok(s) => Ok(s.to_string()),
                Err(status) => Err(SummaryError::Http {
                    status,
                    body: "overloaded".to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_summary_passthrough() {
        assert_eq!(summarize_or_explain(&Fixed(Ok("Looks fine.")), "r"), "Looks fine.");
    }

    #[test]
    fn test_failure_becomes_text() {
        let text = summarize_or_explain(&Fixed(Err(503)), "r");
        assert_eq!(
            text,
            "Error generating LLM summary: summary service returned HTTP 503: overloaded"
        );
    }
}
