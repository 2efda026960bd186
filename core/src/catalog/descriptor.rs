//! Descriptors for registered classes and their methods

use super::docstring::{parse_docstring, ParsedDocstring};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata for one documented method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub method_name: String,
    pub description: String,
    /// Parameter name to type hint, in declaration order
    pub inputs: IndexMap<String, String>,
    pub output: String,
    /// The docstring the descriptor was parsed from
    pub raw_documentation: String,
}

impl MethodDescriptor {
    /// Build a descriptor by parsing a method's docstring
    pub fn from_docstring(method_name: impl Into<String>, docstring: &str) -> Self {
        let ParsedDocstring {
            description,
            inputs,
            output,
        } = parse_docstring(docstring);

        Self {
            method_name: method_name.into(),
            description,
            inputs,
            output,
            raw_documentation: docstring.to_string(),
        }
    }
}

/// Metadata for one registered class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub class_name: String,
    pub description: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    /// Find a method by name
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.method_name == name)
    }
}

/// Class name and description, as returned by `list_classes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub class_name: String,
    pub class_description: String,
}

/// One method flattened together with its class, as returned by `list_methods`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "method")]
    pub method_name: String,
    pub description: String,
    pub inputs: IndexMap<String, String>,
    pub output: String,
}

impl MethodSummary {
    pub(crate) fn new(class_name: &str, method: &MethodDescriptor) -> Self {
        Self {
            class_name: class_name.to_string(),
            method_name: method.method_name.clone(),
            description: method.description.clone(),
            inputs: method.inputs.clone(),
            output: method.output.clone(),
        }
    }
}
