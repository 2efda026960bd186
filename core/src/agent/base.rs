//! Base agent trait

use super::config::AgentConfig;
use super::execution::AgentExecution;
use crate::error::Result;
use crate::trajectory::TrajectoryRecorder;
use async_trait::async_trait;

/// Result type for agent operations
pub type AgentResult<T> = Result<T>;

/// Base trait for agents that turn a query into executed method calls
#[async_trait]
pub trait Agent: Send + Sync {
    /// Select, fill and execute a pipeline for one query
    async fn handle_query(&mut self, query: &str) -> AgentResult<AgentExecution>;

    /// Get the agent's configuration
    fn config(&self) -> &AgentConfig;

    /// Get the agent's name/type
    fn agent_type(&self) -> &str;

    /// Set the trajectory recorder
    fn set_trajectory_recorder(&mut self, recorder: TrajectoryRecorder);

    /// Get the trajectory recorder
    fn trajectory_recorder(&self) -> Option<&TrajectoryRecorder>;
}
