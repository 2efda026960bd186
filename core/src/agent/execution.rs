//! Agent execution result structures

use crate::executor::ExecutionReport;
use crate::plan::{Plan, Selection};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of handling one query end to end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    /// The query that was handled
    pub query: String,

    /// Methods chosen by the selection step
    pub selection: Selection,

    /// The filled pipeline that was executed
    pub pipeline: Plan,

    /// Executor outcome
    pub report: ExecutionReport,

    /// Total handling time in milliseconds
    pub duration_ms: u64,
}

impl AgentExecution {
    /// An execution where translation produced nothing to run
    pub fn empty(query: &str, selection: Selection, duration_ms: u64) -> Self {
        Self {
            query: query.to_string(),
            selection,
            pipeline: Plan::default(),
            report: ExecutionReport::default(),
            duration_ms,
        }
    }

    pub fn results(&self) -> &IndexMap<String, Value> {
        &self.report.results
    }

    /// Whether something was planned and every planned step ran
    pub fn is_complete(&self) -> bool {
        !self.pipeline.is_empty() && self.report.is_complete()
    }
}
