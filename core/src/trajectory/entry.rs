//! Trajectory entry structures

use crate::plan::{Plan, Selection};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// A single entry in the planning trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    /// Unique identifier for this entry
    pub id: String,

    /// Timestamp when this entry was created
    pub timestamp: DateTime<Utc>,

    /// Type of entry
    pub entry_type: EntryType,

    /// Executor pass the entry belongs to (0 outside execution)
    pub step: usize,

    /// Optional metadata
    pub metadata: Option<HashMap<String, Value>>,
}

/// Which translator call a completion belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Selection,
    Fill,
}

/// Type of trajectory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryType {
    /// Query handling started
    QueryStart { query: String, agent_config: Value },

    /// Prompt sent to the completion service
    CompletionRequest {
        stage: Stage,
        service: String,
        prompt: String,
    },

    /// Raw completion received
    CompletionResponse { stage: Stage, response: String },

    /// Completion failed or could not be parsed
    TranslationFailed {
        stage: Stage,
        error: String,
        raw_response: Option<String>,
    },

    /// Methods selected for the query
    SelectionMade { selection: Selection },

    /// The current pipeline was replaced
    PipelineUpdated { pipeline: Plan },

    /// A step ran successfully
    StepExecuted {
        key: String,
        arguments: IndexMap<String, Value>,
        result: Value,
    },

    /// A step raised an error and stays pending
    StepFailed { key: String, error: String },

    /// Query handling finished
    QueryComplete {
        success: bool,
        executed: usize,
        unresolved: usize,
        duration_ms: u64,
    },
}

impl TrajectoryEntry {
    /// Create a new trajectory entry
    pub fn new(entry_type: EntryType, step: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            entry_type,
            step,
            metadata: None,
        }
    }

    /// Add metadata to the entry
    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn query_start(query: String, agent_config: Value) -> Self {
        Self::new(EntryType::QueryStart { query, agent_config }, 0)
    }

    pub fn completion_request(stage: Stage, service: String, prompt: String) -> Self {
        Self::new(
            EntryType::CompletionRequest {
                stage,
                service,
                prompt,
            },
            0,
        )
    }

    pub fn completion_response(stage: Stage, response: String) -> Self {
        Self::new(EntryType::CompletionResponse { stage, response }, 0)
    }

    pub fn translation_failed(stage: Stage, error: String, raw_response: Option<String>) -> Self {
        Self::new(
            EntryType::TranslationFailed {
                stage,
                error,
                raw_response,
            },
            0,
        )
    }

    pub fn selection_made(selection: Selection) -> Self {
        Self::new(EntryType::SelectionMade { selection }, 0)
    }

    pub fn pipeline_updated(pipeline: Plan) -> Self {
        Self::new(EntryType::PipelineUpdated { pipeline }, 0)
    }

    pub fn step_executed(
        key: String,
        arguments: IndexMap<String, Value>,
        result: Value,
        pass: usize,
    ) -> Self {
        Self::new(
            EntryType::StepExecuted {
                key,
                arguments,
                result,
            },
            pass,
        )
    }

    pub fn step_failed(key: String, error: String, pass: usize) -> Self {
        Self::new(EntryType::StepFailed { key, error }, pass)
    }

    pub fn query_complete(
        success: bool,
        executed: usize,
        unresolved: usize,
        duration_ms: u64,
    ) -> Self {
        Self::new(
            EntryType::QueryComplete {
                success,
                executed,
                unresolved,
                duration_ms,
            },
            0,
        )
    }
}
