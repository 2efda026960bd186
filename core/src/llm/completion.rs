//! Text-completion boundary used by the planner

use crate::error::{LlmError, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::client::{ChatOptions, LlmClient};
use super::message::LlmMessage;

/// A service that turns one prompt into one completion.
///
/// The planner only ever needs `prompt -> text`; everything about models,
/// providers and message formats stays behind this trait.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Name used in logs and trajectories
    fn name(&self) -> &str {
        "completion"
    }
}

/// Adapts any [`LlmClient`] into a [`CompletionService`]
pub struct LlmCompletionService {
    client: Arc<dyn LlmClient>,
    options: ChatOptions,
}

impl LlmCompletionService {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            options: ChatOptions::default(),
        }
    }

    /// Set chat options sent with every request
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl CompletionService for LlmCompletionService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .chat_completion(vec![LlmMessage::user(prompt)], Some(self.options.clone()))
            .await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                "{} used {} prompt + {} completion tokens",
                response.model,
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        let text = response.message.content.trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion {
                model: response.model,
            }
            .into());
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        self.client.model_name()
    }
}
