//! Error types and handling for pipewright core

use thiserror::Error;

/// Result type alias for pipewright operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pipewright core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Capability registration errors
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// LLM response translation errors
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Capability invocation errors
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// Agent misuse errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Trajectory recording errors
    #[error("Trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Prompt rendering errors
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Prompt template syntax errors
    #[error("Template syntax error: {0}")]
    TemplateSyntax(#[from] Box<handlebars::TemplateError>),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Empty completion from {model}")]
    EmptyCompletion { model: String },
}

/// Errors raised while registering a capability
#[derive(Error, Debug, PartialEq)]
pub enum RegistrationError {
    #[error("Invalid class name '{name}': {reason}")]
    InvalidClassName { name: String, reason: String },

    #[error("Invalid method name '{class_name}.{method}': {reason}")]
    InvalidMethodName {
        class_name: String,
        method: String,
        reason: String,
    },

    #[error("Method '{method}' is advertised twice by '{class_name}'")]
    DuplicateMethod { class_name: String, method: String },
}

/// Errors raised while turning a completion into a selection or a plan
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    #[error("Completion was empty")]
    EmptyResponse,

    #[error("Unparseable completion at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Completion has the wrong shape: {message}")]
    Shape { message: String },
}

/// Capability invocation errors
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Method not found: {class_name}.{method}")]
    MethodNotFound { class_name: String, method: String },

    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    #[error("Method execution failed: {method} - {message}")]
    ExecutionFailed { method: String, message: String },
}

/// Agent misuse errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("No current pipeline; select relevant methods first")]
    NoPipeline,
}

/// Trajectory recording errors
#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("Failed to record trajectory: {message}")]
    RecordingFailed { message: String },

    #[error("Failed to load trajectory: {path}")]
    LoadFailed { path: String },

    #[error("Invalid trajectory format")]
    InvalidFormat,
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Error::TemplateSyntax(Box::new(err))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
