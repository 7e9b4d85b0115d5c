//! OpenAI drafter - implementation of `MessageDrafter` over chat completions.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let drafter = OpenAIDrafter::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::domain::campaign::DraftRequest;
use crate::ports::{DraftError, MessageDrafter};

/// Configuration for the OpenAI drafter.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
            max_tokens: 300,
            timeout: Duration::from_secs(30),
        }
    }

    /// `None` when no key is configured.
    pub fn from_app_config(config: &AiConfig) -> Option<Self> {
        if !config.has_openai() {
            return None;
        }
        let key = config.openai_api_key.clone()?;
        Some(Self {
            api_key: Secret::new(key),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

pub struct OpenAIDrafter {
    config: Option<OpenAIConfig>,
    client: Client,
}

impl OpenAIDrafter {
    pub fn new(config: OpenAIConfig) -> Result<Self, DraftError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DraftError::Network(e.to_string()))?;
        Ok(Self {
            config: Some(config),
            client,
        })
    }

    /// A drafter that reports itself unavailable.
    pub fn disabled() -> Self {
        Self {
            config: None,
            client: Client::new(),
        }
    }

    fn to_openai_request(config: &OpenAIConfig, request: &DraftRequest) -> ChatRequest {
        ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.as_str().to_string(),
                },
            ],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl MessageDrafter for OpenAIDrafter {
    fn is_available(&self) -> bool {
        self.config.is_some()
    }

    async fn draft(&self, request: &DraftRequest) -> Result<String, DraftError> {
        let config = self.config.as_ref().ok_or(DraftError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", config.base_url))
            .bearer_auth(config.api_key())
            .json(&Self::to_openai_request(config, request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DraftError::Network(format!("Timed out after {}s", config.timeout.as_secs()))
                } else {
                    DraftError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "OpenAI request failed");
            return Err(DraftError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| DraftError::Provider {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DraftError::EmptyResponse);
        }

        if let Some(usage) = body.usage {
            tracing::debug!(
                model = %config.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Drafted campaign message"
            );
        }
        Ok(text)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// OpenAI wire types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::campaign::{DraftPrompt, Tone};

    fn request() -> DraftRequest {
        DraftRequest::new(
            DraftPrompt::new("Lembrar pacientes da limpeza semestral").unwrap(),
            Tone::Professional,
        )
    }

    #[test]
    fn request_carries_system_and_user_messages() {
        let config = OpenAIConfig::new("sk-test");
        let body = serde_json::to_value(OpenAIDrafter::to_openai_request(&config, &request()))
            .unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("profissional e respeitoso"));
        assert_eq!(
            body["messages"][1]["content"],
            "Lembrar pacientes da limpeza semestral"
        );
    }

    #[test]
    fn missing_key_yields_no_config() {
        assert!(OpenAIConfig::from_app_config(&AiConfig::default()).is_none());
    }

    #[tokio::test]
    async fn disabled_drafter_is_unavailable() {
        let drafter = OpenAIDrafter::disabled();
        assert!(!drafter.is_available());
        assert_eq!(drafter.draft(&request()).await, Err(DraftError::NotConfigured));
    }

    #[test]
    fn response_without_content_parses() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(body.choices[0].message.content.is_none());
    }
}
