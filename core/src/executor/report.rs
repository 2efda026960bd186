//! Execution report structures

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of running a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// `Class.method` to result, in execution order
    pub results: IndexMap<String, Value>,

    /// Steps that never ran
    pub unresolved: Vec<UnresolvedStep>,

    /// Number of passes made over the pending steps
    pub passes: usize,
}

impl ExecutionReport {
    /// Whether every planned step executed
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn result(&self, key: &str) -> Option<&Value> {
        self.results.get(key)
    }
}

/// A step that was still pending when execution stopped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedStep {
    pub class_name: String,
    pub method_name: String,

    /// Inputs as written in the plan
    pub inputs: IndexMap<String, Value>,

    /// Parameters whose references could not be resolved
    pub unresolved_inputs: Vec<String>,

    /// Last invocation error, when every input resolved but the call failed
    pub last_error: Option<String>,
}

impl UnresolvedStep {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }
}
