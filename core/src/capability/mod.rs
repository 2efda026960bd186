//! Capabilities the planner can build pipelines from
//!
//! A capability is an object that advertises a set of documented methods and
//! can be invoked by method name with keyword arguments. Documentation uses the
//! grammar understood by [`crate::catalog::parse_docstring`].

pub mod builtin;

use crate::catalog::docstring::{render_docstring, ParsedDocstring};
use crate::error::{CapabilityError, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use builtin::{default_capabilities, ArithmeticOperations, StringUtils};

/// Trait for all capabilities
#[async_trait]
pub trait Capability: Send + Sync {
    /// Type name used as the class name when no alias is given
    fn type_name(&self) -> &str;

    /// Class-level description
    fn description(&self) -> &str {
        ""
    }

    /// Methods this capability exposes
    fn methods(&self) -> Vec<MethodDoc>;

    /// Invoke a method with already resolved arguments
    async fn invoke(&self, call: &MethodCall) -> Result<Value>;
}

/// A method name together with its documentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDoc {
    pub name: String,
    pub docstring: Option<String>,
}

impl MethodDoc {
    pub fn new(name: impl Into<String>, docstring: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docstring: Some(docstring.into()),
        }
    }

    /// A method without documentation. It is never offered to the planner.
    pub fn undocumented(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docstring: None,
        }
    }

    /// Build the documentation from explicit fields
    pub fn described(
        name: impl Into<String>,
        description: impl Into<String>,
        inputs: &[(&str, &str)],
        output: impl Into<String>,
    ) -> Self {
        let parsed = ParsedDocstring {
            description: description.into(),
            inputs: inputs
                .iter()
                .map(|(param, type_hint)| (param.to_string(), type_hint.to_string()))
                .collect(),
            output: output.into(),
        };
        Self::new(name, render_docstring(&parsed))
    }
}

/// A call to a capability method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    /// Unique identifier for this call
    pub id: String,

    /// Class name the capability was registered under
    pub class_name: String,

    /// Method to invoke
    pub method: String,

    /// Keyword arguments
    pub arguments: IndexMap<String, Value>,
}

impl MethodCall {
    pub fn new(
        class_name: impl Into<String>,
        method: impl Into<String>,
        arguments: IndexMap<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            class_name: class_name.into(),
            method: method.into(),
            arguments,
        }
    }

    /// Qualified `Class.method` key
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.method)
    }

    /// Get an argument by name
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self
            .arguments
            .get(key)
            .ok_or_else(|| CapabilityError::InvalidParameters {
                message: format!("Missing parameter: {}", key),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| {
            CapabilityError::InvalidParameters {
                message: format!("Invalid parameter type for: {}", key),
            }
            .into()
        })
    }

    /// Get an argument by name with a default
    pub fn get_parameter_or<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        self.get_parameter(key).unwrap_or(default)
    }

    /// Error for a method this capability does not implement
    pub fn not_found(&self) -> crate::error::Error {
        CapabilityError::MethodNotFound {
            class_name: self.class_name.clone(),
            method: self.method.clone(),
        }
        .into()
    }
}
