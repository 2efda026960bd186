//! Builds class descriptors from registered capabilities

use super::descriptor::{ClassDescriptor, MethodDescriptor};
use crate::capability::Capability;
use crate::error::RegistrationError;
use std::collections::HashSet;

fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name.contains('.') {
        Some("name contains '.', which is reserved for Class.method references")
    } else if name.chars().any(char::is_whitespace) {
        Some("name contains whitespace")
    } else {
        None
    }
}

/// Extract the descriptor for a capability registered under `class_name`.
///
/// Methods starting with `_` are private and methods without documentation
/// cannot be planned against; both are skipped. Nothing is mutated here, so
/// an error leaves the catalog exactly as it was.
pub fn extract_class(
    capability: &dyn Capability,
    class_name: &str,
) -> Result<ClassDescriptor, RegistrationError> {
    if let Some(reason) = name_problem(class_name) {
        return Err(RegistrationError::InvalidClassName {
            name: class_name.to_string(),
            reason: reason.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut methods = Vec::new();

    for doc in capability.methods() {
        if !seen.insert(doc.name.clone()) {
            return Err(RegistrationError::DuplicateMethod {
                class_name: class_name.to_string(),
                method: doc.name,
            });
        }

        if doc.name.starts_with('_') {
            tracing::debug!("Skipping private method {}.{}", class_name, doc.name);
            continue;
        }

        if let Some(reason) = name_problem(&doc.name) {
            return Err(RegistrationError::InvalidMethodName {
                class_name: class_name.to_string(),
                method: doc.name,
                reason: reason.to_string(),
            });
        }

        match doc.docstring.as_deref().map(str::trim) {
            Some(docstring) if !docstring.is_empty() => {
                methods.push(MethodDescriptor::from_docstring(&doc.name, docstring));
            }
            _ => tracing::debug!("Skipping undocumented method {}.{}", class_name, doc.name),
        }
    }

    Ok(ClassDescriptor {
        class_name: class_name.to_string(),
        description: capability.description().trim().to_string(),
        methods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{MethodCall, MethodDoc};
    use crate::error::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Fixture {
        methods: Vec<MethodDoc>,
    }

    #[async_trait]
    impl Capability for Fixture {
        fn type_name(&self) -> &str {
            "Fixture"
        }

        fn methods(&self) -> Vec<MethodDoc> {
            self.methods.clone()
        }

        async fn invoke(&self, call: &MethodCall) -> Result<Value> {
            Err(call.not_found())
        }
    }

    #[test]
    fn test_skips_private_and_undocumented_methods() {
        let fixture = Fixture {
            methods: vec![
                MethodDoc::described("add", "Adds", &[("a", "int")], "int"),
                MethodDoc::new("_helper", "- Description: internal"),
                MethodDoc::undocumented("bare"),
                MethodDoc::new("blank", "   "),
            ],
        };

        let class = extract_class(&fixture, "Calc").unwrap();
        assert_eq!(class.class_name, "Calc");
        assert_eq!(class.description, "");
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].method_name, "add");
        assert!(class.method("bare").is_none());
    }

    #[test]
    fn test_zero_methods_is_not_an_error() {
        let class = extract_class(&Fixture { methods: vec![] }, "Empty").unwrap();
        assert!(class.methods.is_empty());
    }

    #[test]
    fn test_rejects_bad_names() {
        let fixture = Fixture { methods: vec![] };
        assert!(matches!(
            extract_class(&fixture, ""),
            Err(RegistrationError::InvalidClassName { .. })
        ));
        assert!(matches!(
            extract_class(&fixture, "My.Calc"),
            Err(RegistrationError::InvalidClassName { .. })
        ));

        let fixture = Fixture {
            methods: vec![MethodDoc::new("do it", "- Description: x")],
        };
        assert!(matches!(
            extract_class(&fixture, "Calc"),
            Err(RegistrationError::InvalidMethodName { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_methods() {
        let fixture = Fixture {
            methods: vec![
                MethodDoc::new("add", "- Description: one"),
                MethodDoc::new("add", "- Description: two"),
            ],
        };
        assert_eq!(
            extract_class(&fixture, "Calc"),
            Err(RegistrationError::DuplicateMethod {
                class_name: "Calc".to_string(),
                method: "add".to_string(),
            })
        );
    }
}
