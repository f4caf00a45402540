//! Conversational model collaborator.
//!
//! The orchestrator only needs "system context + user input in, reply text
//! out"; [`ChatModel`] is that seam and [`GroqChat`] the production backend.

mod groq;

use async_trait::async_trait;

pub use groq::GroqChat;

/// A hosted model that answers one user message under a system context.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the model's reply. An empty string is a valid (if useless) reply.
    async fn reply(&self, system_context: &str, user_input: &str) -> Result<String, ChatError>;
}

/// Errors that can occur while calling the chat model.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Groq API key not configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Model returned no choices")]
    EmptyResponse,
}
