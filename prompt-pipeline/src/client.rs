use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, Provider};
use crate::{PipelineError, Result};

/// Anything that can answer a single prompt with text
pub trait TextGenerator {
    fn call(&self, prompt: &str, model: &str) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP client for the configured text-generation provider
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

impl LlmClient {
    /// Build a client; invalid configurations are rejected up front
    pub fn new(config: LlmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn call_chat(&self, prompt: &str, model: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url());
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!("{} API error: {} - {}", self.config.provider, status, error_text);
            return Err(PipelineError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let api_response: ChatResponse = response.json().await?;
        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(PipelineError::EmptyResponse)
    }

    async fn call_gemini(&self, prompt: &str, model: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.config.base_url(), model);
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!("Gemini API error: {} - {}", status, error_text);
            return Err(PipelineError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let api_response: GeminiResponse = response.json().await?;
        let text: String = api_response
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(PipelineError::EmptyResponse);
        }
        Ok(text)
    }
}

impl TextGenerator for LlmClient {
    async fn call(&self, prompt: &str, model: &str) -> Result<String> {
        info!("Sending prompt to {} (model: {})", self.config.provider, model);
        let content = match self.config.provider {
            Provider::Google => self.call_gemini(prompt, model).await?,
            Provider::OpenAi | Provider::Ollama => self.call_chat(prompt, model).await?,
        };
        debug!("LLM response: {}", content);
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = LlmConfig {
            provider: Provider::OpenAi,
            model: "gpt-4o".to_string(),
            api_key: None,
            base_url: None,
        };
        assert!(matches!(LlmClient::new(config), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            model: "llama3",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_gemini_response_parts_are_joined() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"rooms\""},{"text":": []}"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0].content.parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(text, r#"{"rooms": []}"#);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_surfaces_http_error() {
        let client = LlmClient::new(LlmConfig {
            provider: Provider::Ollama,
            model: "llama3".to_string(),
            api_key: None,
            base_url: Some("http://127.0.0.1:9".to_string()),
        })
        .unwrap();
        let err = client.call("describe", "llama3").await.unwrap_err();
        assert!(matches!(err, PipelineError::Http(_)));
    }
}
