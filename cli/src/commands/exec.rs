//! Execute a hand-written plan file without any completion calls

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use pipewright_core::capability::default_capabilities;
use pipewright_core::translator::parse_plan;
use pipewright_core::{
    AgentConfig, CompletionService, ExecutionReport, Plan, PlannerAgent, DEFAULT_MAX_PASSES,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::print_report;

/// Completion service for sessions that never translate queries
struct Offline;

#[async_trait]
impl CompletionService for Offline {
    async fn complete(&self, _prompt: &str) -> pipewright_core::Result<String> {
        Err("exec runs without a completion service".into())
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Run the plan in `plan_path` against the built-in capabilities
pub async fn exec_command(plan_path: &Path, max_passes: Option<usize>) -> Result<()> {
    info!("Executing plan file: {}", plan_path.display());

    let text = tokio::fs::read_to_string(plan_path)
        .await
        .with_context(|| format!("Failed to read plan file: {}", plan_path.display()))?;
    let plan = parse_plan(&text)
        .map_err(|e| anyhow!("Invalid plan in {}: {}", plan_path.display(), e))?;

    println!("🧩 {} planned steps\n", plan.step_count());

    let report = execute(&plan, max_passes.unwrap_or(DEFAULT_MAX_PASSES)).await?;
    print_report(&report);

    Ok(())
}

async fn execute(plan: &Plan, max_passes: usize) -> Result<ExecutionReport> {
    let mut agent = PlannerAgent::new(AgentConfig::default(), Arc::new(Offline))?;
    agent.register_all(default_capabilities())?;
    Ok(agent.execute_plan(Some(plan), max_passes).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_execute_chains_builtin_methods() {
        let plan = parse_plan(
            r#"{"classes": [
                {"class_name": "StringUtils", "methods": [
                    {"method": "to_upper", "inputs": {"text": "StringUtils.reverse_string"}},
                    {"method": "reverse_string", "inputs": {"text": "abc"}}
                ]}
            ]}"#,
        )
        .unwrap();

        let report = execute(&plan, 5).await.unwrap();
        assert_eq!(report.results["StringUtils.reverse_string"], json!("cba"));
        assert_eq!(report.results["StringUtils.to_upper"], json!("CBA"));
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_divide_by_zero_stays_unresolved() {
        let plan = parse_plan(
            r#"{'classes': [{'class_name': 'ArithmeticOperations', 'methods': [
                {'method': 'divide', 'inputs': {'a': 1, 'b': 0}}]}]}"#,
        )
        .unwrap();

        let report = execute(&plan, 5).await.unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.unresolved.len(), 1);
        assert!(report.unresolved[0]
            .last_error
            .as_deref()
            .unwrap()
            .contains("Cannot divide by zero"));
    }

    #[tokio::test]
    async fn test_exec_command_rejects_prose() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "run add then double").unwrap();

        assert!(exec_command(file.path(), None).await.is_err());
    }
}
