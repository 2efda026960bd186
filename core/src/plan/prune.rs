//! Narrow the catalog down to a selection

use super::{Plan, PlannedClass, PlannedMethod, Selection};
use crate::catalog::Catalog;
use serde_json::Value;

/// Build a plan skeleton holding only the selected classes and methods.
///
/// Catalog order wins over selection order. Classes left without methods are
/// dropped. Kept methods carry their name, their typed inputs and their output
/// description; descriptions and raw documentation are not copied.
pub fn method_context_subset(catalog: &Catalog, selection: &Selection) -> Plan {
    let classes = catalog
        .classes()
        .iter()
        .filter_map(|class| {
            let wanted = selection.get(&class.class_name)?;
            let methods: Vec<PlannedMethod> = class
                .methods
                .iter()
                .filter(|method| wanted.contains(&method.method_name))
                .map(|method| PlannedMethod {
                    method: method.method_name.clone(),
                    inputs: method
                        .inputs
                        .iter()
                        .map(|(name, type_hint)| (name.clone(), Value::String(type_hint.clone())))
                        .collect(),
                    output: method.output.clone(),
                })
                .collect();

            if methods.is_empty() {
                None
            } else {
                Some(PlannedClass {
                    class_name: class.class_name.clone(),
                    methods,
                })
            }
        })
        .collect();

    Plan { classes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClassDescriptor, MethodDescriptor};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert_class(ClassDescriptor {
            class_name: "Calc".to_string(),
            description: String::new(),
            methods: vec![
                MethodDescriptor::from_docstring(
                    "add",
                    "- Description: adds\n- param a: x :type: int\n- param b: y :type: int\n:rtype: int",
                ),
                MethodDescriptor::from_docstring(
                    "double",
                    "- Description: doubles\n- param x: x :type: int\n:rtype: int",
                ),
            ],
        });
        catalog.insert_class(ClassDescriptor {
            class_name: "Text".to_string(),
            description: String::new(),
            methods: vec![MethodDescriptor::from_docstring(
                "upper",
                "- Description: upper\n:rtype: str",
            )],
        });
        catalog
    }

    fn selection(entries: &[(&str, &[&str])]) -> Selection {
        entries
            .iter()
            .map(|(class, methods)| {
                (
                    class.to_string(),
                    methods.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_keeps_only_selected_methods() {
        let plan = method_context_subset(&catalog(), &selection(&[("Calc", &["add"])]));
        assert_eq!(plan.classes.len(), 1);
        assert_eq!(plan.classes[0].class_name, "Calc");
        assert_eq!(plan.classes[0].methods.len(), 1);

        let add = serde_json::to_value(&plan.classes[0].methods[0]).unwrap();
        assert_eq!(add["method"], "add");
        assert_eq!(add["inputs"]["a"], "int");
        assert_eq!(add["output"], "int");
        assert!(add.get("description").is_none());
        assert!(add.get("raw_documentation").is_none());
    }

    #[test]
    fn test_classes_without_kept_methods_are_dropped() {
        let plan = method_context_subset(
            &catalog(),
            &selection(&[("Text", &["missing"]), ("Unknown", &["add"]), ("Calc", &["double"])]),
        );
        let names: Vec<_> = plan.classes.iter().map(|c| c.class_name.as_str()).collect();
        assert_eq!(names, vec!["Calc"]);
    }

    #[test]
    fn test_empty_selection_gives_empty_plan() {
        assert!(method_context_subset(&catalog(), &Selection::new()).classes.is_empty());
    }
}
