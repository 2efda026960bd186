//! Planner agent: registration, translation and execution in one session

pub mod base;
pub mod config;
pub mod core;
pub mod execution;

pub use base::{Agent, AgentResult};
pub use config::{AgentBuilder, AgentConfig};
pub use core::PlannerAgent;
pub use execution::AgentExecution;
