//! Dependency-resolving pipeline executor
//!
//! Steps run in plan order, over and over, until every step has run, a pass
//! makes no progress, or the pass budget is spent. An input is either a
//! literal, the result of an earlier step in this run, or a value already in
//! the catalog. There is no topological sort, so a chain of references deeper
//! than the pass budget does not fully resolve.

pub mod report;

pub use report::{ExecutionReport, UnresolvedStep};

use crate::capability::{Capability, MethodCall};
use crate::catalog::Catalog;
use crate::plan::{looks_like_qualified_reference, qualified_key, Plan};
use crate::trajectory::{TrajectoryEntry, TrajectoryRecorder};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Default number of passes over pending steps
pub const DEFAULT_MAX_PASSES: usize = 5;

/// Live capability instances keyed by class name
pub type InstanceTable = HashMap<String, Arc<dyn Capability>>;

struct ExecutionStep {
    key: String,
    class_name: String,
    instance: Arc<dyn Capability>,
    method_name: String,
    raw_inputs: IndexMap<String, Value>,
    unresolved_inputs: Vec<String>,
    last_error: Option<String>,
}

/// Runs plans against registered instances, writing results into the catalog
pub struct PipelineExecutor<'a> {
    instances: &'a InstanceTable,
    catalog: &'a mut Catalog,
    recorder: Option<&'a TrajectoryRecorder>,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(instances: &'a InstanceTable, catalog: &'a mut Catalog) -> Self {
        Self {
            instances,
            catalog,
            recorder: None,
        }
    }

    /// Record executed and failed steps
    pub fn with_recorder(mut self, recorder: Option<&'a TrajectoryRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Run a plan with at most `max_passes` passes
    pub async fn run(&mut self, plan: &Plan, max_passes: usize) -> ExecutionReport {
        tracing::info!(
            "Starting pipeline execution: {} planned steps, up to {} passes",
            plan.step_count(),
            max_passes
        );

        let mut pending = self.flatten(plan);
        let mut results = IndexMap::new();
        let mut passes = 0;

        while passes < max_passes && !pending.is_empty() {
            passes += 1;
            let mut progress = false;
            let mut still_pending = Vec::with_capacity(pending.len());

            for mut step in pending {
                let arguments = match self.resolve_inputs(&step.raw_inputs, &results) {
                    Ok(arguments) => arguments,
                    Err(missing) => {
                        tracing::debug!(
                            "Deferring {}: unresolved inputs {:?}",
                            step.key,
                            missing
                        );
                        step.unresolved_inputs = missing;
                        still_pending.push(step);
                        continue;
                    }
                };
                step.unresolved_inputs.clear();

                let call = MethodCall::new(&step.class_name, &step.method_name, arguments);
                tracing::info!(
                    "Executing {} with inputs: {}",
                    step.key,
                    serde_json::to_string(&call.arguments).unwrap_or_default()
                );

                match step.instance.invoke(&call).await {
                    Ok(output) => {
                        self.catalog.store_result(&step.key, output.clone());
                        results.insert(step.key.clone(), output.clone());
                        self.record(TrajectoryEntry::step_executed(
                            step.key.clone(),
                            call.arguments,
                            output,
                            passes,
                        ))
                        .await;
                        progress = true;
                    }
                    Err(e) => {
                        tracing::error!("Error executing {}: {}", step.key, e);
                        step.last_error = Some(e.to_string());
                        self.record(TrajectoryEntry::step_failed(
                            step.key.clone(),
                            e.to_string(),
                            passes,
                        ))
                        .await;
                        still_pending.push(step);
                    }
                }
            }

            pending = still_pending;
            if !progress {
                tracing::warn!("No progress made in pass {}, stopping", passes);
                break;
            }
        }

        if !pending.is_empty() {
            tracing::warn!("Unresolved methods due to missing inputs or errors:");
            for step in &pending {
                tracing::warn!(
                    " - {} (inputs: {}, unresolved: {:?}{})",
                    step.key,
                    serde_json::to_string(&step.raw_inputs).unwrap_or_default(),
                    step.unresolved_inputs,
                    step.last_error
                        .as_ref()
                        .map(|e| format!(", last error: {}", e))
                        .unwrap_or_default()
                );
            }
        }

        tracing::info!(
            "Pipeline execution completed: {} executed, {} unresolved, {} passes",
            results.len(),
            pending.len(),
            passes
        );

        ExecutionReport {
            results,
            unresolved: pending
                .into_iter()
                .map(|step| UnresolvedStep {
                    class_name: step.class_name,
                    method_name: step.method_name,
                    inputs: step.raw_inputs,
                    unresolved_inputs: step.unresolved_inputs,
                    last_error: step.last_error,
                })
                .collect(),
            passes,
        }
    }

    /// Turn the plan into an ordered step list, skipping unregistered classes
    fn flatten(&self, plan: &Plan) -> Vec<ExecutionStep> {
        let mut steps = Vec::new();
        let mut seen = HashSet::new();

        for class in &plan.classes {
            let Some(instance) = self.instances.get(&class.class_name) else {
                tracing::warn!("Class '{}' is not registered", class.class_name);
                continue;
            };

            for method in &class.methods {
                let key = qualified_key(&class.class_name, &method.method);
                if !seen.insert(key.clone()) {
                    tracing::warn!("Step {} is listed more than once, skipping repeat", key);
                    continue;
                }

                steps.push(ExecutionStep {
                    key,
                    class_name: class.class_name.clone(),
                    instance: Arc::clone(instance),
                    method_name: method.method.clone(),
                    raw_inputs: method.inputs.clone(),
                    unresolved_inputs: Vec::new(),
                    last_error: None,
                });
            }
        }

        steps
    }

    /// Resolve every input, or return the names of those that can't be resolved yet
    fn resolve_inputs(
        &self,
        raw_inputs: &IndexMap<String, Value>,
        results: &IndexMap<String, Value>,
    ) -> Result<IndexMap<String, Value>, Vec<String>> {
        let mut resolved = IndexMap::with_capacity(raw_inputs.len());
        let mut missing = Vec::new();

        for (param, raw) in raw_inputs {
            if !looks_like_qualified_reference(raw) {
                resolved.insert(param.clone(), raw.clone());
                continue;
            }

            let Value::String(reference) = raw else {
                continue;
            };
            match results
                .get(reference)
                .or_else(|| self.catalog.value(reference))
            {
                Some(value) => {
                    resolved.insert(param.clone(), value.clone());
                }
                None => missing.push(param.clone()),
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(missing)
        }
    }

    async fn record(&self, entry: TrajectoryEntry) {
        if let Some(recorder) = self.recorder {
            if let Err(e) = recorder.record(entry).await {
                tracing::warn!("Failed to record trajectory entry: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::MethodDoc;
    use crate::error::{CapabilityError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// `add(a, b)`, `double(x)`, `flaky()` failing on its first call,
    /// `echo(..)` returning its arguments, `stats(text)`
    #[derive(Default)]
    struct Calc {
        flaky_calls: AtomicUsize,
    }

    #[async_trait]
    impl Capability for Calc {
        fn type_name(&self) -> &str {
            "Calc"
        }

        fn methods(&self) -> Vec<MethodDoc> {
            vec![
                MethodDoc::described("add", "Adds", &[("a", "int"), ("b", "int")], "int"),
                MethodDoc::described("double", "Doubles", &[("x", "int")], "int"),
            ]
        }

        async fn invoke(&self, call: &MethodCall) -> Result<Value> {
            match call.method.as_str() {
                "add" => {
                    let a: i64 = call.get_parameter("a")?;
                    let b: i64 = call.get_parameter("b")?;
                    Ok(json!(a + b))
                }
                "double" => {
                    let x: i64 = call.get_parameter("x")?;
                    Ok(json!(x * 2))
                }
                "flaky" => {
                    if self.flaky_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(CapabilityError::ExecutionFailed {
                            method: call.qualified_name(),
                            message: "warming up".to_string(),
                        }
                        .into())
                    } else {
                        Ok(json!("ok"))
                    }
                }
                "echo" => Ok(Value::Object(call.arguments.clone().into_iter().collect())),
                "stats" => {
                    let text: String = call.get_parameter("text")?;
                    Ok(json!({
                        "stats.words": text.split_whitespace().count(),
                        "stats.chars": text.len(),
                    }))
                }
                _ => Err(call.not_found()),
            }
        }
    }

    fn instances() -> InstanceTable {
        let mut table: InstanceTable = HashMap::new();
        table.insert("Calc".to_string(), Arc::new(Calc::default()));
        table
    }

    fn plan(value: Value) -> Plan {
        serde_json::from_value(value).unwrap()
    }

    async fn run(plan: &Plan, max_passes: usize) -> (ExecutionReport, Catalog) {
        let instances = instances();
        let mut catalog = Catalog::new();
        let report = PipelineExecutor::new(&instances, &mut catalog)
            .run(plan, max_passes)
            .await;
        (report, catalog)
    }

    #[tokio::test]
    async fn test_forward_reference_resolves() {
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "add", "inputs": {"a": 2, "b": 3}, "output": ""},
            {"method": "double", "inputs": {"x": "Calc.add"}, "output": ""}
        ]}]}));

        let (report, catalog) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert_eq!(
            report.results.iter().collect::<Vec<_>>(),
            vec![
                (&"Calc.add".to_string(), &json!(5)),
                (&"Calc.double".to_string(), &json!(10)),
            ]
        );
        assert!(report.is_complete());
        assert_eq!(catalog.value("Calc.double"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_non_string_inputs_pass_through_verbatim() {
        let inputs = json!({
            "flag": true,
            "nothing": null,
            "items": ["Calc.add", 1],
            "options": {"source": "Calc.add"},
            "word": "plain"
        });
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "echo", "inputs": inputs.clone()}
        ]}]}));

        let (report, _) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert_eq!(report.passes, 1);
        assert_eq!(report.result("Calc.echo"), Some(&inputs));
    }

    #[tokio::test]
    async fn test_reference_declared_before_its_source() {
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "double", "inputs": {"x": "Calc.add"}},
            {"method": "add", "inputs": {"a": 2, "b": 3}}
        ]}]}));

        let (report, _) = run(&plan, 2).await;
        assert_eq!(report.passes, 2);
        assert_eq!(report.result("Calc.double"), Some(&json!(10)));
        let keys: Vec<_> = report.results.keys().cloned().collect();
        assert_eq!(keys, vec!["Calc.add", "Calc.double"]);

        let (report, _) = run(&plan, 1).await;
        assert_eq!(report.result("Calc.double"), None);
        assert_eq!(report.unresolved.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_reference_terminates() {
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "add", "inputs": {"a": 2, "b": 3}},
            {"method": "double", "inputs": {"x": "Calc.missing"}}
        ]}]}));

        let (report, _) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.result("Calc.add"), Some(&json!(5)));
        assert!(report.passes <= DEFAULT_MAX_PASSES);

        let unresolved = &report.unresolved[0];
        assert_eq!(unresolved.qualified_name(), "Calc.double");
        assert_eq!(unresolved.unresolved_inputs, vec!["x"]);
        assert_eq!(unresolved.last_error, None);
    }

    #[tokio::test]
    async fn test_failed_invocation_is_retried() {
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "flaky", "inputs": {}},
            {"method": "add", "inputs": {"a": 1, "b": 1}}
        ]}]}));

        let (report, _) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert_eq!(report.result("Calc.flaky"), Some(&json!("ok")));
        assert_eq!(report.passes, 2);
    }

    #[tokio::test]
    async fn test_failure_without_progress_is_reported() {
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "add", "inputs": {"a": "two", "b": 1}}
        ]}]}));

        let (report, _) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert!(report.results.is_empty());
        assert_eq!(report.passes, 1);
        assert!(report.unresolved[0].last_error.is_some());
        assert!(report.unresolved[0].unresolved_inputs.is_empty());
    }

    #[tokio::test]
    async fn test_object_results_are_merged_and_referencable() {
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "stats", "inputs": {"text": "one two three"}},
            {"method": "double", "inputs": {"x": "stats.words"}}
        ]}]}));

        let (report, catalog) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert_eq!(report.result("Calc.double"), Some(&json!(6)));
        assert_eq!(catalog.value("stats.chars"), Some(&json!(13)));
        assert!(catalog.value("Calc.stats").is_some());
    }

    #[tokio::test]
    async fn test_unregistered_class_is_skipped() {
        let plan = plan(json!({"classes": [
            {"class_name": "Ghost", "methods": [{"method": "boo", "inputs": {}}]},
            {"class_name": "Calc", "methods": [{"method": "add", "inputs": {"a": 1, "b": 2}}]}
        ]}));

        let (report, _) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert_eq!(report.result("Calc.add"), Some(&json!(3)));
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_catalog_values_persist_across_runs() {
        let instances = instances();
        let mut catalog = Catalog::new();

        let first = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "add", "inputs": {"a": 20, "b": 1}}
        ]}]}));
        PipelineExecutor::new(&instances, &mut catalog)
            .run(&first, DEFAULT_MAX_PASSES)
            .await;

        let second = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "double", "inputs": {"x": "Calc.add"}}
        ]}]}));
        let report = PipelineExecutor::new(&instances, &mut catalog)
            .run(&second, DEFAULT_MAX_PASSES)
            .await;
        assert_eq!(report.result("Calc.double"), Some(&json!(42)));
        assert!(report.result("Calc.add").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_steps_run_once() {
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "flaky", "inputs": {}},
            {"method": "flaky", "inputs": {}},
            {"method": "add", "inputs": {"a": 1, "b": 1}}
        ]}]}));

        let (report, _) = run(&plan, DEFAULT_MAX_PASSES).await;
        assert!(report.is_complete());
        assert_eq!(report.results.len(), 2);
    }

    #[tokio::test]
    async fn test_records_steps() {
        let instances = instances();
        let mut catalog = Catalog::new();
        let recorder = TrajectoryRecorder::new();
        let plan = plan(json!({"classes": [{"class_name": "Calc", "methods": [
            {"method": "flaky", "inputs": {}},
            {"method": "add", "inputs": {"a": 1, "b": 1}}
        ]}]}));

        PipelineExecutor::new(&instances, &mut catalog)
            .with_recorder(Some(&recorder))
            .run(&plan, DEFAULT_MAX_PASSES)
            .await;

        // flaky failed, add ran, flaky ran
        assert_eq!(recorder.entry_count().await, 3);
    }
}
