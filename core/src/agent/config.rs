//! Agent configuration structures

use super::PlannerAgent;
use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::{ConfigError, Result};
use crate::executor::DEFAULT_MAX_PASSES;
use crate::llm::{
    AnthropicClient, ChatOptions, CompletionService, LlmClient, LlmCompletionService, OpenAiClient,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for a planner agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum executor passes per run
    pub max_passes: usize,

    /// Deadline for each completion call
    pub completion_timeout_secs: u64,

    /// Custom method-selection template (optional)
    /// Slots: `classes`, `user_query`
    #[serde(default)]
    pub selection_template: Option<String>,

    /// Custom input-filling template (optional)
    /// Slots: `contexts`, `query`
    #[serde(default)]
    pub fill_template: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            completion_timeout_secs: 60,
            selection_template: None,
            fill_template: None,
        }
    }
}

/// Builder for creating agents with resolved LLM configuration
pub struct AgentBuilder {
    llm_config: ResolvedLlmConfig,
    agent_config: AgentConfig,
}

impl AgentBuilder {
    /// Create a new agent builder with LLM configuration
    pub fn new(llm_config: ResolvedLlmConfig) -> Self {
        Self {
            llm_config,
            agent_config: AgentConfig::default(),
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum executor passes
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.agent_config.max_passes = max_passes;
        self
    }

    /// Set the completion deadline
    pub fn with_completion_timeout_secs(mut self, secs: u64) -> Self {
        self.agent_config.completion_timeout_secs = secs;
        self
    }

    /// Build the agent, creating an LLM client for the configured protocol
    pub fn build(self) -> Result<PlannerAgent> {
        self.llm_config.validate()?;

        let client: Arc<dyn LlmClient> = match &self.llm_config.protocol {
            Protocol::OpenAICompat | Protocol::AzureOpenAI => {
                Arc::new(OpenAiClient::new(&self.llm_config)?)
            }
            Protocol::Anthropic => Arc::new(AnthropicClient::new(&self.llm_config)?),
            other => {
                return Err(ConfigError::UnsupportedProtocol {
                    protocol: other.as_str().to_string(),
                }
                .into())
            }
        };

        tracing::debug!(
            "Using {} model {}",
            client.provider_name(),
            client.model_name()
        );

        let completion: Arc<dyn CompletionService> = Arc::new(
            LlmCompletionService::new(client)
                .with_options(ChatOptions::from(&self.llm_config.params)),
        );

        PlannerAgent::new(self.agent_config, completion)
    }
}
