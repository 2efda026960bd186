//! # pipewright Core
//!
//! Core library for pipewright - an LLM-planned method pipeline builder.
//!
//! Integrators register capabilities whose methods carry structured
//! docstrings. A free-text query is mapped by a text-completion service to a
//! subset of those methods and then to concrete inputs, where an input may be
//! a `"ClassName.methodName"` reference to another method's output. The
//! executor runs the resulting plan with bounded multi-pass dependency
//! resolution.

// Core modules
pub mod agent;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod llm;
pub mod plan;
pub mod trajectory;
pub mod translator;

// Re-export commonly used types
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentExecution, PlannerAgent};
pub use capability::{Capability, MethodCall, MethodDoc};
pub use catalog::{parse_docstring, Catalog, ClassDescriptor, MethodDescriptor};
pub use config::{ModelParams, Protocol, ResolvedLlmConfig};
pub use error::{Error, Result};
pub use executor::{ExecutionReport, UnresolvedStep, DEFAULT_MAX_PASSES};
pub use llm::CompletionService;
pub use plan::{looks_like_qualified_reference, Plan, PlannedClass, PlannedMethod, Selection};
pub use trajectory::TrajectoryRecorder;

/// Current version of the pipewright-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
