//! Capability listing command

use anyhow::Result;
use pipewright_core::capability::default_capabilities;
use pipewright_core::catalog::{extract_class, Catalog};
use tracing::info;

/// Show the built-in capabilities and their documented methods
pub async fn capabilities_command() -> Result<()> {
    info!("Listing available capabilities");

    let catalog = builtin_catalog()?;

    println!("🛠️  Available Capabilities\n");

    for class in catalog.classes() {
        println!("📦 {}", class.class_name);
        if !class.description.is_empty() {
            println!("   {}", class.description);
        }
        for method in &class.methods {
            let inputs: Vec<String> = method
                .inputs
                .iter()
                .map(|(name, hint)| format!("{}: {}", name, hint))
                .collect();
            println!(
                "   • {}({}) -> {}",
                method.method_name,
                inputs.join(", "),
                if method.output.is_empty() { "N/A" } else { method.output.as_str() }
            );
            if !method.description.is_empty() {
                println!("     {}", method.description);
            }
        }
        println!();
    }

    println!("💡 Reference another method's output with \"ClassName.methodName\" as an input value.");

    Ok(())
}

fn builtin_catalog() -> Result<Catalog> {
    let mut catalog = Catalog::new();
    for capability in default_capabilities() {
        let class = extract_class(capability.as_ref(), capability.type_name())?;
        catalog.insert_class(class);
    }
    Ok(catalog)
}
