//! Client for OpenAI-compatible chat completion endpoints.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Summarizer, SummaryError};
use crate::config::LlmConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const NO_SUMMARY: &str = "No summary generated.";

const SYSTEM_PROMPT: &str = "You are an expert software engineer and code quality reviewer \
    with deep knowledge of Python, JavaScript, security best practices, and software \
    engineering principles.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Summarizer backed by `POST {base_url}/chat/completions`.
pub struct OpenAiSummarizer {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiSummarizer {
    /// Create a summarizer. Base URL and API key are required.
    pub fn new(config: &LlmConfig) -> Result<Self, SummaryError> {
        let base_url = config
            .base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(SummaryError::NotConfigured("LLM_BASE_URL"))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SummaryError::NotConfigured("LLM_API_KEY"))?;

        let http = Client::builder()
            .user_agent(concat!("lintreport/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request<'a>(&'a self, report: &str) -> ChatRequest<'a> {
        let prompt = format!(
            "Analyze this linting report and provide a clear, concise summary.\n\n\
             Linting Report:\n{}\n\n\
             Provide only the summary content as output.",
            report
        );
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Request a summary of `report`.
    pub async fn summarize_async(&self, report: &str) -> Result<String, SummaryError> {
        tracing::debug!(model = %self.model, endpoint = %self.endpoint(), "requesting summary");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request(report))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Http {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(first_choice(parsed))
    }
}

fn first_choice(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_SUMMARY.to_string())
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(&self, report: &str) -> Result<String, SummaryError> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.summarize_async(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            base_url: Some("http://localhost:11434/v1/".to_string()),
            api_key: Some("key".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_requires_base_url_and_key() {
        let missing_url = LlmConfig {
            base_url: None,
            ..config()
        };
        assert!(matches!(
            OpenAiSummarizer::new(&missing_url),
            Err(SummaryError::NotConfigured("LLM_BASE_URL"))
        ));

        let blank_key = LlmConfig {
            api_key: Some("  ".to_string()),
            ..config()
        };
        assert!(matches!(
            OpenAiSummarizer::new(&blank_key),
            Err(SummaryError::NotConfigured("LLM_API_KEY"))
        ));
    }

    #[test]
    fn test_endpoint_joins_path() {
        let s = OpenAiSummarizer::new(&config()).unwrap();
        assert_eq!(s.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_request_body() {
        let s = OpenAiSummarizer::new(&config()).unwrap();
        let body = serde_json::to_value(s.request("# Linting Report")).unwrap();
        assert_eq!(body["model"], "gemini-2.0-flash");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("# Linting Report"));
    }

    #[test]
    fn test_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  Two errors.  "}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(parsed), "Two errors.");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(first_choice(empty), NO_SUMMARY);

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(first_choice(null), NO_SUMMARY);
    }
}
