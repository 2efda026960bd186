//! Strict parsing of completion responses
//!
//! The whole response must be the requested structure. One surrounding
//! markdown code fence is tolerated; any other text around it is rejected.

use super::literal::parse_python_literal;
use crate::error::TranslationError;
use crate::plan::{Plan, Selection};
use serde_json::Value;

/// Remove a single surrounding ```` ``` ```` / ```` ```json ```` fence
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. `json`) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a response as JSON, falling back to a Python literal
pub fn parse_structure(text: &str) -> Result<Value, TranslationError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(TranslationError::EmptyResponse);
    }

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(_) => parse_python_literal(body),
    }
}

/// Parse a selection response: `{class: [method, ...]}`.
///
/// Entries written as `Other.method` name a dependency in another class and
/// are moved under that class.
pub fn parse_selection(text: &str) -> Result<Selection, TranslationError> {
    let Value::Object(entries) = parse_structure(text)? else {
        return Err(TranslationError::Shape {
            message: "selection must be a mapping of class names to method lists".to_string(),
        });
    };

    let mut selection = Selection::new();
    for (class_name, methods) in entries {
        let Value::Array(methods) = methods else {
            return Err(TranslationError::Shape {
                message: format!("methods for '{}' must be a list", class_name),
            });
        };

        selection.entry(class_name.clone()).or_default();
        for method in methods {
            let Value::String(method) = method else {
                return Err(TranslationError::Shape {
                    message: format!("method names for '{}' must be strings", class_name),
                });
            };

            let (target_class, method_name) = match method.split_once('.') {
                Some((other, name)) => (other.to_string(), name.to_string()),
                None => (class_name.clone(), method),
            };

            let methods = selection.entry(target_class).or_default();
            if !methods.contains(&method_name) {
                methods.push(method_name);
            }
        }
    }

    Ok(selection)
}

/// Parse a filled-in plan response
pub fn parse_plan(text: &str) -> Result<Plan, TranslationError> {
    let value = parse_structure(text)?;
    if !value.get("classes").is_some_and(Value::is_array) {
        return Err(TranslationError::Shape {
            message: "plan must be an object with a 'classes' list".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| TranslationError::Shape {
        message: e.to_string(),
    })
}
