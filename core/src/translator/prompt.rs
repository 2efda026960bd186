//! Instruction templates sent to the completion service

use crate::catalog::Catalog;
use crate::error::Result;
use crate::plan::Plan;
use handlebars::Handlebars;
use serde_json::{json, Value};

const SELECTION: &str = "selection";
const FILL: &str = "fill";

/// Template for picking relevant methods. Slots: `classes`, `user_query`.
pub const SELECTION_TEMPLATE: &str = r#"You are an AI assistant that can choose a class to handle a user query.

List of classes:
{{classes}}

User query: {{user_query}}

Instruction:
You are given a user query and a list of classes with their associated methods and method descriptions.

Your task is to:
1. Analyze the user query and determine which class or classes contain methods that can help answer the query.
2. For each selected class, return a list of method names (only the names) that are relevant to the query.
3. The output must be a dictionary in the following format:

{
    'class_name1': ['method1', 'method2'],
    'class_name2': ['method3']
}

4. If a output to a query depends on execution of a set of methods first, include them in the format of <class_name>.<method_name>

Rules:
- Only include classes that contain at least one relevant method.
- Only include methods that directly relate to the query.
- If no methods match, return an empty dictionary: {}
- Do not return any explanation or extra text, **only the dictionary output**.
- You should not change the class name and use the exact class name as it is.
"#;

/// Template for filling method inputs. Slots: `contexts`, `query`.
pub const FILL_TEMPLATE: &str = r#"You are an AI assistant that analyzes a user query and fills in input values for methods defined in the provided context.

Context:
{{contexts}}

Query:
{{query}}

Instructions:

- For each method, check if its required inputs are directly provided in the query.
- If an input value is not found in the query, check if any previous method's output can be used instead.
- If a method depends on a previous result, represent that input as "ClassName.methodName".
- Only use such references if they logically make sense — do NOT force linking all methods.
- Preserve the structure: Do NOT rename keys, drop methods, or add extra fields.
- Your output should include ONLY the updated JSON pipeline structure with filled `inputs`.


Expected Output format:
{
"classes": [
    {
    "class_name": "SomeClass",
    "methods": [
        {
        "method": "some_method",
        "inputs": {
            "param1": "value1",
            "param2": 42
        },
        "output": "..."
        }
    ]
    },
    ...
]
}

Only output this JSON structure. Do not explain anything.
"#;

/// Renders the two instruction templates
pub struct PromptRenderer {
    registry: Handlebars<'static>,
}

impl PromptRenderer {
    /// Renderer with the built-in templates
    pub fn new() -> Result<Self> {
        Self::with_templates(None, None)
    }

    /// Renderer with optional replacement templates.
    ///
    /// Custom templates are compiled here, so a broken template fails at
    /// construction rather than on the first query.
    pub fn with_templates(selection: Option<&str>, fill: Option<&str>) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry.register_template_string(SELECTION, selection.unwrap_or(SELECTION_TEMPLATE))?;
        registry.register_template_string(FILL, fill.unwrap_or(FILL_TEMPLATE))?;
        Ok(Self { registry })
    }

    pub fn render_selection(&self, classes: &str, query: &str) -> Result<String> {
        Ok(self.registry.render(
            SELECTION,
            &json!({ "classes": classes, "user_query": query }),
        )?)
    }

    pub fn render_fill(&self, contexts: &str, query: &str) -> Result<String> {
        Ok(self
            .registry
            .render(FILL, &json!({ "contexts": contexts, "query": query }))?)
    }
}

/// One line per catalog method: class, method and description
pub fn selection_summary(catalog: &Catalog) -> String {
    catalog
        .list_methods()
        .iter()
        .map(|m| {
            format!(
                "Class: {} - Method: {} - Description: {}",
                m.class_name, m.method_name, m.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One block per pipeline method: class, method, typed inputs and output
pub fn fill_summary(plan: &Plan) -> String {
    plan.classes
        .iter()
        .flat_map(|class| {
            class.methods.iter().map(move |method| {
                let inputs = method
                    .inputs
                    .iter()
                    .map(|(name, hint)| match hint {
                        Value::String(s) => format!("{} ({})", name, s),
                        other => format!("{} ({})", name, other),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let output = if method.output.is_empty() {
                    "N/A"
                } else {
                    method.output.as_str()
                };
                format!(
                    "Class: {}\nMethod: {}\nInputs: {}\nOutput: {}",
                    class.class_name, method.method, inputs, output
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}
