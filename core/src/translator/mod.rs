//! Query-to-plan translation through the completion service

pub mod literal;
pub mod prompt;
pub mod response;

pub use literal::parse_python_literal;
pub use prompt::{fill_summary, selection_summary, PromptRenderer, FILL_TEMPLATE, SELECTION_TEMPLATE};
pub use response::{parse_plan, parse_selection, parse_structure, strip_code_fence};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::llm::CompletionService;
use crate::plan::Plan;
use std::sync::Arc;
use std::time::Duration;

/// Builds prompts and talks to the completion service with a deadline
pub struct QueryTranslator {
    completion: Arc<dyn CompletionService>,
    prompts: PromptRenderer,
    timeout: Duration,
}

impl QueryTranslator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        prompts: PromptRenderer,
        timeout: Duration,
    ) -> Self {
        Self {
            completion,
            prompts,
            timeout,
        }
    }

    /// Name of the underlying completion service
    pub fn service_name(&self) -> &str {
        self.completion.name()
    }

    /// Prompt asking which methods are relevant to the query
    pub fn selection_prompt(&self, catalog: &Catalog, query: &str) -> Result<String> {
        self.prompts
            .render_selection(&selection_summary(catalog), query)
    }

    /// Prompt asking for the inputs of every method in the pipeline
    pub fn fill_prompt(&self, pipeline: &Plan, query: &str) -> Result<String> {
        self.prompts.render_fill(&fill_summary(pipeline), query)
    }

    /// Send a prompt, failing with a timeout error if no answer arrives in time
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Sending {} byte prompt to {}",
            prompt.len(),
            self.completion.name()
        );
        let response = tokio::time::timeout(self.timeout, self.completion.complete(prompt)).await??;
        tracing::debug!("Completion returned {} bytes", response.len());
        Ok(response)
    }
}
