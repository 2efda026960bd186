//! Forward references between pipeline steps

use serde_json::Value;

/// The `Class.method` key a step's result is stored under
pub fn qualified_key(class_name: &str, method: &str) -> String {
    format!("{}.{}", class_name, method)
}

/// Whether an input value should be resolved as a reference instead of used literally.
///
/// Only strings containing a `.` qualify. This is a heuristic: literal strings
/// such as `"3.14"`, URLs or email addresses are also treated as references and
/// will only resolve if a value with exactly that key exists.
pub fn looks_like_qualified_reference(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_detection() {
        assert!(looks_like_qualified_reference(&json!("Calc.add")));
        assert!(!looks_like_qualified_reference(&json!("hello world")));
        assert!(!looks_like_qualified_reference(&json!(2.5)));
        assert!(!looks_like_qualified_reference(&json!(null)));
        assert!(!looks_like_qualified_reference(&json!(["Calc.add"])));
        // Known false positive
        assert!(looks_like_qualified_reference(&json!("user@example.com")));
    }

    #[test]
    fn test_qualified_key() {
        assert_eq!(qualified_key("Calc", "add"), "Calc.add");
    }
}
