//! String manipulation capability

use crate::capability::{Capability, MethodCall, MethodDoc};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Common string manipulation: case conversion, analysis and search
pub struct StringUtils;

const TEXT_PARAM: &str = "- param text: Input string :type: str";

#[async_trait]
impl Capability for StringUtils {
    fn type_name(&self) -> &str {
        "StringUtils"
    }

    fn description(&self) -> &str {
        "Provides methods for common string manipulation operations such as formatting, case conversion, and analysis."
    }

    fn methods(&self) -> Vec<MethodDoc> {
        vec![
            MethodDoc::new(
                "to_upper",
                format!(
                    "- Description: Converts the input string to uppercase.\n{}\n\
                     :return: Uppercase version of the input string\n:rtype: str",
                    TEXT_PARAM
                ),
            ),
            MethodDoc::new(
                "to_lower",
                format!(
                    "- Description: Converts the input string to lowercase.\n{}\n\
                     :return: Lowercase version of the input string\n:rtype: str",
                    TEXT_PARAM
                ),
            ),
            MethodDoc::new(
                "count_words",
                format!(
                    "- Description: Counts the number of words in the input string.\n{}\n\
                     :return: Total number of words in the input string\n:rtype: int",
                    TEXT_PARAM
                ),
            ),
            MethodDoc::new(
                "reverse_string",
                format!(
                    "- Description: Reverses the characters in the input string.\n{}\n\
                     :return: Reversed string\n:rtype: str",
                    TEXT_PARAM
                ),
            ),
            MethodDoc::described(
                "contains_substring",
                "Checks whether the input string contains the specified substring.",
                &[("text", "str"), ("substring", "str")],
                "bool",
            ),
        ]
    }

    async fn invoke(&self, call: &MethodCall) -> Result<Value> {
        let text: String = call.get_parameter("text")?;

        match call.method.as_str() {
            "to_upper" => Ok(json!(text.to_uppercase())),
            "to_lower" => Ok(json!(text.to_lowercase())),
            "count_words" => Ok(json!(text.split_whitespace().count())),
            "reverse_string" => Ok(json!(text.chars().rev().collect::<String>())),
            "contains_substring" => {
                let substring: String = call.get_parameter("substring")?;
                Ok(json!(text.contains(&substring)))
            }
            _ => Err(call.not_found()),
        }
    }
}
