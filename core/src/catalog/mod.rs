//! The catalog of registered classes, their methods and execution values

pub mod descriptor;
pub mod docstring;
pub mod extractor;

pub use descriptor::{ClassDescriptor, ClassSummary, MethodDescriptor, MethodSummary};
pub use docstring::{parse_docstring, render_docstring, ParsedDocstring};
pub use extractor::extract_class;

use crate::plan::qualified_key;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Registered class descriptors plus the value store shared by every run.
///
/// Class names are unique and keep their registration order. A key written to
/// the value store is never removed for the lifetime of the catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    classes: Vec<ClassDescriptor>,
    #[serde(skip)]
    method_index: HashMap<String, MethodDescriptor>,
    values: IndexMap<String, Value>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class descriptor, replacing one with the same name in place
    pub fn insert_class(&mut self, class: ClassDescriptor) {
        let prefix = format!("{}.", class.class_name);
        self.method_index.retain(|key, _| !key.starts_with(&prefix));
        for method in &class.methods {
            self.method_index.insert(
                qualified_key(&class.class_name, &method.method_name),
                method.clone(),
            );
        }

        match self
            .classes
            .iter_mut()
            .find(|existing| existing.class_name == class.class_name)
        {
            Some(existing) => {
                tracing::info!("Replacing registration of class '{}'", class.class_name);
                *existing = class;
            }
            None => self.classes.push(class),
        }
    }

    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.iter().find(|c| c.class_name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Look up a method by its `Class.method` key
    pub fn method(&self, qualified: &str) -> Option<&MethodDescriptor> {
        self.method_index.get(qualified)
    }

    /// All registered classes with their descriptions
    pub fn list_classes(&self) -> Vec<ClassSummary> {
        self.classes
            .iter()
            .map(|class| ClassSummary {
                class_name: class.class_name.clone(),
                class_description: class.description.clone(),
            })
            .collect()
    }

    /// All methods flattened in registration order
    pub fn list_methods(&self) -> Vec<MethodSummary> {
        self.classes
            .iter()
            .flat_map(|class| {
                class
                    .methods
                    .iter()
                    .map(move |method| MethodSummary::new(&class.class_name, method))
            })
            .collect()
    }

    /// A stored execution value
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Store a method result under its qualified key.
    ///
    /// Object results also have each of their fields stored as a top-level
    /// key. Returns the merged keys that overwrote a different existing value.
    pub fn store_result(&mut self, key: &str, value: Value) -> Vec<String> {
        let mut collisions = Vec::new();

        if let Value::Object(fields) = &value {
            for (field, field_value) in fields {
                if let Some(existing) = self.values.get(field) {
                    if existing != field_value {
                        tracing::warn!(
                            "Result of {} overwrites context key '{}' ({} -> {})",
                            key,
                            field,
                            existing,
                            field_value
                        );
                        collisions.push(field.clone());
                    }
                }
                self.values.insert(field.clone(), field_value.clone());
            }
        }

        self.values.insert(key.to_string(), value);
        collisions
    }
}
