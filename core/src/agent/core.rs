//! PlannerAgent implementation

use super::config::AgentConfig;
use crate::agent::{Agent, AgentExecution, AgentResult};
use crate::capability::Capability;
use crate::catalog::{extract_class, Catalog, ClassSummary, MethodDescriptor, MethodSummary};
use crate::error::{AgentError, Result};
use crate::executor::{ExecutionReport, InstanceTable, PipelineExecutor};
use crate::llm::CompletionService;
use crate::plan::{method_context_subset, Plan, Selection};
use crate::translator::{parse_plan, parse_selection, PromptRenderer, QueryTranslator};
use crate::trajectory::{Stage, TrajectoryEntry, TrajectoryRecorder};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One planning session: the catalog, the live instances and the current pipeline.
///
/// Every operation that touches session state takes `&mut self`, so a single
/// agent serves one caller at a time. Wrap it in a `tokio::sync::Mutex` to
/// share it between tasks.
pub struct PlannerAgent {
    config: AgentConfig,
    translator: QueryTranslator,
    catalog: Catalog,
    instances: InstanceTable,
    pipeline: Option<Plan>,
    trajectory_recorder: Option<TrajectoryRecorder>,
}

impl PlannerAgent {
    /// Create an agent on top of any completion service
    pub fn new(config: AgentConfig, completion: Arc<dyn CompletionService>) -> Result<Self> {
        let prompts = PromptRenderer::with_templates(
            config.selection_template.as_deref(),
            config.fill_template.as_deref(),
        )?;
        let translator = QueryTranslator::new(
            completion,
            prompts,
            Duration::from_secs(config.completion_timeout_secs),
        );

        Ok(Self {
            config,
            translator,
            catalog: Catalog::new(),
            instances: InstanceTable::new(),
            pipeline: None,
            trajectory_recorder: None,
        })
    }

    /// Register a capability under `alias`, or under its type name.
    ///
    /// Registering the same name again replaces the earlier class. On error
    /// nothing is changed.
    pub fn register(&mut self, capability: Arc<dyn Capability>, alias: Option<&str>) -> Result<()> {
        let class_name = alias.unwrap_or_else(|| capability.type_name()).to_string();
        tracing::info!("Registering class '{}'", class_name);

        let class = extract_class(capability.as_ref(), &class_name)?;
        let method_count = class.methods.len();

        self.catalog.insert_class(class);
        self.instances.insert(class_name.clone(), capability);

        tracing::info!(
            "Successfully registered class '{}' with {} documented methods",
            class_name,
            method_count
        );
        Ok(())
    }

    /// Register several capabilities under their type names
    pub fn register_all<I>(&mut self, capabilities: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn Capability>>,
    {
        for capability in capabilities {
            self.register(capability, None)?;
        }
        Ok(())
    }

    /// Ask the completion service which methods are relevant to `query`.
    ///
    /// On success the pruned selection becomes the current pipeline.
    pub async fn try_select_relevant_methods(&mut self, query: &str) -> Result<Selection> {
        tracing::info!("Selecting methods for query");

        let prompt = self.translator.selection_prompt(&self.catalog, query)?;
        let raw = self.complete(Stage::Selection, &prompt).await?;

        let selection = match parse_selection(&raw) {
            Ok(selection) => selection,
            Err(e) => {
                tracing::error!("Failed to parse method selection: {}", e);
                tracing::error!("Raw response from LLM:\n{}", raw);
                self.record(TrajectoryEntry::translation_failed(
                    Stage::Selection,
                    e.to_string(),
                    Some(raw),
                ))
                .await;
                return Err(e.into());
            }
        };

        let pipeline = method_context_subset(&self.catalog, &selection);
        tracing::info!(
            "Selected {} methods across {} classes",
            pipeline.step_count(),
            pipeline.classes.len()
        );

        self.record(TrajectoryEntry::selection_made(selection.clone()))
            .await;
        self.record(TrajectoryEntry::pipeline_updated(pipeline.clone()))
            .await;
        self.pipeline = Some(pipeline);

        Ok(selection)
    }

    /// Like [`Self::try_select_relevant_methods`], but any failure selects nothing
    pub async fn select_relevant_methods(&mut self, query: &str) -> Selection {
        match self.try_select_relevant_methods(query).await {
            Ok(selection) => selection,
            Err(e) => {
                tracing::warn!("Method selection failed, selecting nothing: {}", e);
                Selection::new()
            }
        }
    }

    /// Prune the catalog to `selected`, or to the current pipeline's methods
    pub fn get_method_context_subset(&self, selected: Option<&Selection>) -> Result<Plan> {
        match selected {
            Some(selection) => Ok(method_context_subset(&self.catalog, selection)),
            None => {
                let pipeline = self.pipeline.as_ref().ok_or(AgentError::NoPipeline)?;
                Ok(method_context_subset(&self.catalog, &pipeline.as_selection()))
            }
        }
    }

    /// Ask the completion service to fill the inputs of the current pipeline.
    ///
    /// On success the filled plan replaces the current pipeline; on failure
    /// the pipeline is left as it was.
    pub async fn try_fill_input_parameters(&mut self, query: &str) -> Result<Plan> {
        let pipeline = self.pipeline.as_ref().ok_or(AgentError::NoPipeline)?;
        if pipeline.is_empty() {
            tracing::info!("Current pipeline is empty, nothing to fill");
            return Ok(pipeline.clone());
        }

        tracing::info!("Determining input parameters for query");
        let prompt = self.translator.fill_prompt(pipeline, query)?;
        let raw = self.complete(Stage::Fill, &prompt).await?;

        let plan = match parse_plan(&raw) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!("Failed to parse filled pipeline: {}", e);
                tracing::error!("Raw response from LLM:\n{}", raw);
                self.record(TrajectoryEntry::translation_failed(
                    Stage::Fill,
                    e.to_string(),
                    Some(raw),
                ))
                .await;
                return Err(e.into());
            }
        };

        self.record(TrajectoryEntry::pipeline_updated(plan.clone()))
            .await;
        self.pipeline = Some(plan.clone());
        tracing::info!("Filled inputs for {} methods", plan.step_count());

        Ok(plan)
    }

    /// Fill inputs, degrading to an empty plan when translation fails.
    ///
    /// Calling this before any pipeline exists is an error.
    pub async fn fill_input_parameters(&mut self, query: &str) -> Result<Plan> {
        if self.pipeline.is_none() {
            return Err(AgentError::NoPipeline.into());
        }

        match self.try_fill_input_parameters(query).await {
            Ok(plan) => Ok(plan),
            Err(e) => {
                tracing::warn!("Input filling failed, pipeline unchanged: {}", e);
                Ok(Plan::default())
            }
        }
    }

    /// Execute `plan`, or the current pipeline, and report what ran and what didn't
    pub async fn execute_plan(
        &mut self,
        plan: Option<&Plan>,
        max_passes: usize,
    ) -> Result<ExecutionReport> {
        let plan = match plan {
            Some(plan) => plan.clone(),
            None => self.pipeline.clone().ok_or(AgentError::NoPipeline)?,
        };

        let report = PipelineExecutor::new(&self.instances, &mut self.catalog)
            .with_recorder(self.trajectory_recorder.as_ref())
            .run(&plan, max_passes)
            .await;
        Ok(report)
    }

    /// Execute and return only the results of the steps that ran
    pub async fn run_pipeline_with_dependencies(
        &mut self,
        plan: Option<&Plan>,
        max_passes: usize,
    ) -> Result<IndexMap<String, Value>> {
        Ok(self.execute_plan(plan, max_passes).await?.results)
    }

    /// Replace the current pipeline, e.g. with a hand-built subset
    pub fn set_pipeline(&mut self, pipeline: Plan) {
        self.pipeline = Some(pipeline);
    }

    pub fn current_pipeline(&self) -> Option<&Plan> {
        self.pipeline.as_ref()
    }

    pub fn list_classes(&self) -> Vec<ClassSummary> {
        self.catalog.list_classes()
    }

    pub fn list_methods(&self) -> Vec<MethodSummary> {
        self.catalog.list_methods()
    }

    /// Descriptor for a `Class.method` key
    pub fn method_doc(&self, qualified: &str) -> Option<&MethodDescriptor> {
        self.catalog.method(qualified)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// A stored result or merged field
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.catalog.value(key)
    }

    async fn complete(&self, stage: Stage, prompt: &str) -> Result<String> {
        self.record(TrajectoryEntry::completion_request(
            stage,
            self.translator.service_name().to_string(),
            prompt.to_string(),
        ))
        .await;

        match self.translator.complete(prompt).await {
            Ok(raw) => {
                self.record(TrajectoryEntry::completion_response(stage, raw.clone()))
                    .await;
                Ok(raw)
            }
            Err(e) => {
                tracing::error!("Completion failed: {}", e);
                self.record(TrajectoryEntry::translation_failed(stage, e.to_string(), None))
                    .await;
                Err(e)
            }
        }
    }

    async fn record(&self, entry: TrajectoryEntry) {
        if let Some(recorder) = &self.trajectory_recorder {
            if let Err(e) = recorder.record(entry).await {
                tracing::warn!("Failed to record trajectory entry: {}", e);
            }
        }
    }
}

#[async_trait]
impl Agent for PlannerAgent {
    async fn handle_query(&mut self, query: &str) -> AgentResult<AgentExecution> {
        let start = Instant::now();
        self.record(TrajectoryEntry::query_start(
            query.to_string(),
            serde_json::to_value(&self.config)?,
        ))
        .await;

        let execution = match self.try_select_relevant_methods(query).await {
            Err(e) => {
                tracing::warn!("Method selection failed, nothing to run: {}", e);
                AgentExecution::empty(query, Selection::new(), 0)
            }
            Ok(selection) => match self.try_fill_input_parameters(query).await {
                Err(e) => {
                    tracing::warn!("Input filling failed, nothing to run: {}", e);
                    AgentExecution::empty(query, selection, 0)
                }
                Ok(pipeline) => {
                    let report = self
                        .execute_plan(Some(&pipeline), self.config.max_passes)
                        .await?;
                    AgentExecution {
                        query: query.to_string(),
                        selection,
                        pipeline,
                        report,
                        duration_ms: 0,
                    }
                }
            },
        };

        let execution = AgentExecution {
            duration_ms: start.elapsed().as_millis() as u64,
            ..execution
        };

        self.record(TrajectoryEntry::query_complete(
            execution.is_complete(),
            execution.report.results.len(),
            execution.report.unresolved.len(),
            execution.duration_ms,
        ))
        .await;

        Ok(execution)
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn agent_type(&self) -> &str {
        "pipewright_agent"
    }

    fn set_trajectory_recorder(&mut self, recorder: TrajectoryRecorder) {
        self.trajectory_recorder = Some(recorder);
    }

    fn trajectory_recorder(&self) -> Option<&TrajectoryRecorder> {
        self.trajectory_recorder.as_ref()
    }
}
