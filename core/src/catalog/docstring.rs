//! Structured docstring parsing
//!
//! Methods describe themselves with a small line-oriented grammar:
//!
//! ```text
//! - Description: This method adds two numbers.
//! - List of parameters:
//!     - param a: First number :type: int or float
//!     - param b: Second number :type: int or float
//! :return: Sum of a and b
//! :rtype: int or float
//! ```
//!
//! Parsing is best effort. Lines that match nothing are ignored.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const DESCRIPTION_KEY: &str = "- description:";
const PARAM_PREFIX: &str = "- param";
const RTYPE_MARKER: &str = ":rtype:";
const RETURN_MARKER: &str = ":return:";

/// Result of parsing one docstring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocstring {
    /// Free-text description of the method
    pub description: String,

    /// Parameter name to type hint, in declaration order
    pub inputs: IndexMap<String, String>,

    /// Return type or return description
    pub output: String,
}

fn param_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^- param (\w+): .*?:type:\s*(.*)$").expect("param pattern is valid")
    })
}

/// Parse a docstring into description, typed inputs and output
pub fn parse_docstring(text: &str) -> ParsedDocstring {
    let mut parsed = ParsedDocstring::default();

    for line in text.trim().lines() {
        let line = line.trim();

        if line.to_lowercase().starts_with(DESCRIPTION_KEY) {
            if let Some((_, rest)) = line.split_once(':') {
                parsed.description = rest.trim().to_string();
            }
        } else if line.starts_with(PARAM_PREFIX) {
            if let Some(captures) = param_pattern().captures(line) {
                parsed
                    .inputs
                    .insert(captures[1].to_string(), captures[2].to_string());
            }
        } else if let Some(rest) = line.strip_prefix(RTYPE_MARKER) {
            parsed.output = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(RETURN_MARKER) {
            if parsed.output.is_empty() {
                parsed.output = rest.trim().to_string();
            }
        }
    }

    parsed
}

/// Render a parsed docstring back into the grammar understood by [`parse_docstring`]
pub fn render_docstring(doc: &ParsedDocstring) -> String {
    let mut lines = Vec::with_capacity(doc.inputs.len() + 2);

    if !doc.description.is_empty() {
        lines.push(format!("- Description: {}", doc.description));
    }
    for (name, type_hint) in &doc.inputs {
        lines.push(format!("- param {}: {} :type: {}", name, name, type_hint));
    }
    if !doc.output.is_empty() {
        lines.push(format!("{} {}", RTYPE_MARKER, doc.output));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD_DOC: &str = r#"
        - Description: This method adds two numbers.
        - List of parameters:
            - param a: First number :type: int or float
            - param b: Second number :type: int or float
        :return: Sum of a and b :rtype: int or float
    "#;

    #[test]
    fn test_parses_description_params_and_return() {
        let parsed = parse_docstring(ADD_DOC);
        assert_eq!(parsed.description, "This method adds two numbers.");
        assert_eq!(
            parsed.inputs.iter().collect::<Vec<_>>(),
            vec![
                (&"a".to_string(), &"int or float".to_string()),
                (&"b".to_string(), &"int or float".to_string()),
            ]
        );
        assert_eq!(parsed.output, "Sum of a and b :rtype: int or float");
    }

    #[test]
    fn test_parsing_is_deterministic() {
        assert_eq!(parse_docstring(ADD_DOC), parse_docstring(ADD_DOC));
    }

    #[test]
    fn test_rtype_overrides_return() {
        let parsed = parse_docstring(":return: the total\n:rtype: int");
        assert_eq!(parsed.output, "int");

        let parsed = parse_docstring(":rtype: int\n:return: the total");
        assert_eq!(parsed.output, "int");
    }

    #[test]
    fn test_description_key_is_case_insensitive() {
        let parsed = parse_docstring("- DESCRIPTION: Shout: loudly");
        assert_eq!(parsed.description, "Shout: loudly");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let parsed = parse_docstring("- param broken\n- param x :type: int\nrandom text");
        assert!(parsed.inputs.is_empty());
        assert_eq!(parsed, ParsedDocstring::default());
    }

    #[test]
    fn test_render_is_parsed_back() {
        let mut inputs = IndexMap::new();
        inputs.insert("text".to_string(), "str".to_string());
        inputs.insert("substring".to_string(), "str".to_string());
        let doc = ParsedDocstring {
            description: "Checks whether the text contains a substring.".to_string(),
            inputs,
            output: "bool".to_string(),
        };

        assert_eq!(parse_docstring(&render_docstring(&doc)), doc);
    }
}
