use log::debug;
use serde::{Deserialize, Serialize};

use super::error::CompletionError;
use crate::macro_config::{ApiKey, MacroConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: MessageContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice. `Ok(None)` when the model returned no text.
    pub fn first_content(&self) -> Result<Option<&str>, CompletionError> {
        let choice = self.choices.first().ok_or(CompletionError::NoChoices)?;
        Ok(choice.message.content.as_deref().filter(|c| !c.trim().is_empty()))
    }
}

/// Chat-completion endpoint.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait CompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, CompletionError>;
}

/// OpenAI-compatible client for the DeepSeek API.
pub struct DeepSeekClient {
    base_url: String,
    api_key: ApiKey,
    http_client: reqwest::Client,
}

impl DeepSeekClient {
    pub fn new(config: &MacroConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client: reqwest::Client::new(),
        }
    }
}

impl CompletionClient for DeepSeekClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {} model={}", url, request.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CompletionError::Decode(e.to_string()))
    }
}
