//! CLI command implementations

pub mod capabilities;
pub mod exec;
pub mod run;

pub use capabilities::capabilities_command;
pub use exec::exec_command;
pub use run::run_command;

use pipewright_core::ExecutionReport;

/// Print executed results followed by anything left unresolved
pub(crate) fn print_report(report: &ExecutionReport) {
    if report.results.is_empty() {
        println!("🤷 Nothing was executed");
    }

    for (key, value) in &report.results {
        println!("✅ {} = {}", key, value);
    }

    for step in &report.unresolved {
        let mut line = format!(
            "⚠️  {} unresolved (inputs: {})",
            step.qualified_name(),
            step.unresolved_inputs.join(", ")
        );
        if let Some(error) = &step.last_error {
            line.push_str(&format!(", last error: {}", error));
        }
        println!("{}", line);
    }

    println!(
        "\n📊 {} executed, {} unresolved, {} passes",
        report.results.len(),
        report.unresolved.len(),
        report.passes
    );
}
