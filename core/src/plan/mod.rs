//! Pipeline plans produced by the translator and consumed by the executor

pub mod prune;
pub mod reference;

pub use prune::method_context_subset;
pub use reference::{looks_like_qualified_reference, qualified_key};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Class name to the method names selected from it
pub type Selection = IndexMap<String, Vec<String>>;

/// A declarative call graph: which methods to run and with what inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub classes: Vec<PlannedClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedClass {
    pub class_name: String,
    #[serde(default)]
    pub methods: Vec<PlannedMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedMethod {
    pub method: String,

    /// Literal values or `Class.method` references. Freshly pruned plans hold
    /// type hints here until inputs are filled.
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub output: String,
}

/// Accept null and non-string outputs instead of failing the whole plan
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.classes.iter().all(|class| class.methods.is_empty())
    }

    /// Number of planned method calls
    pub fn step_count(&self) -> usize {
        self.classes.iter().map(|class| class.methods.len()).sum()
    }

    /// Interpret the plan as a selection of class and method names
    pub fn as_selection(&self) -> Selection {
        let mut selection = Selection::new();
        for class in &self.classes {
            selection
                .entry(class.class_name.clone())
                .or_default()
                .extend(class.methods.iter().map(|m| m.method.clone()));
        }
        selection
    }

    /// Parse a plan from JSON text
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_null_fields_default_to_empty() {
        let plan: Plan = serde_json::from_value(json!({
            "classes": [{
                "class_name": "Calc",
                "methods": [
                    {"method": "add", "inputs": {"a": 2, "b": 3}},
                    {"method": "double", "output": null},
                    {"method": "triple", "output": 3}
                ]
            }]
        }))
        .unwrap();

        let methods = &plan.classes[0].methods;
        assert_eq!(methods[0].output, "");
        assert!(methods[1].inputs.is_empty());
        assert_eq!(methods[1].output, "");
        assert_eq!(methods[2].output, "3");
        assert_eq!(plan.step_count(), 3);
    }

    #[test]
    fn test_as_selection() {
        let plan = Plan::from_json(
            r#"{"classes":[{"class_name":"Calc","methods":[{"method":"add"},{"method":"double"}]}]}"#,
        )
        .unwrap();
        let selection = plan.as_selection();
        assert_eq!(selection["Calc"], vec!["add".to_string(), "double".to_string()]);
        assert!(!plan.is_empty());
        assert!(Plan::default().is_empty());
    }

    #[test]
    fn test_requires_classes() {
        assert!(Plan::from_json("{}").is_err());
    }
}
