//! GroqChat - chat completions over Groq's OpenAI-compatible API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatError, ChatModel};
use crate::config::ChatConfig;

/// Request body for a chat completion.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error envelope used by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for a single model on Groq.
pub struct GroqChat {
    api_key: String,
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl GroqChat {
    /// Create a client for the model named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::MissingApiKey` if `api_key` is blank.
    pub fn new(api_key: impl Into<String>, config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatModel for GroqChat {
    async fn reply(&self, system_context: &str, user_input: &str) -> Result<String, ChatError> {
        let mut messages = Vec::with_capacity(2);
        if !system_context.trim().is_empty() {
            messages.push(Message {
                role: "system",
                content: system_context,
            });
        }
        messages.push(Message {
            role: "user",
            content: user_input,
        });

        let request_body = CompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            log::warn!("Chat completion failed with status {}: {}", status, message);
            return Err(ChatError::Api(format!("{} ({})", message, status)));
        }

        let completion: CompletionResponse = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(ChatError::EmptyResponse)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
