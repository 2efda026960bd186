//! Single query execution command

use anyhow::{Context, Result};
use pipewright_core::capability::default_capabilities;
use pipewright_core::{Agent, AgentBuilder, TrajectoryRecorder};
use std::path::PathBuf;
use tracing::{debug, info};

use super::print_report;
use crate::config::CliConfigLoader;

/// Select, fill and execute a pipeline for one query
pub async fn run_command(
    query: String,
    config_loader: CliConfigLoader,
    max_passes: Option<usize>,
    trajectory_file: Option<PathBuf>,
) -> Result<()> {
    info!("Handling query: {}", query);

    let loaded = config_loader.load().await?;
    info!("🤖 Using protocol: {}", loaded.llm.protocol.as_str());
    info!("🤖 Using model: {}", loaded.llm.model);

    let mut agent_config = loaded.agent;
    if let Some(passes) = max_passes {
        agent_config.max_passes = passes;
    }

    let mut agent = AgentBuilder::new(loaded.llm)
        .with_agent_config(agent_config)
        .build()
        .context("Failed to build planner agent")?;
    agent
        .register_all(default_capabilities())
        .context("Failed to register built-in capabilities")?;
    debug!("Registered {} classes", agent.list_classes().len());

    if let Some(trajectory_file) = &trajectory_file {
        info!("📊 Trajectory file: {}", trajectory_file.display());
        agent.set_trajectory_recorder(TrajectoryRecorder::with_file(trajectory_file));
    }

    let execution = agent.handle_query(&query).await?;

    if execution.selection.is_empty() {
        println!("🔍 No relevant methods were selected");
    } else {
        println!("🔍 Selected methods:");
        for (class_name, methods) in &execution.selection {
            println!("   {}: {}", class_name, methods.join(", "));
        }
        println!();
    }

    print_report(&execution.report);

    if let Some(recorder) = agent.trajectory_recorder() {
        recorder.save().await?;
        if let Some(path) = recorder.file_path() {
            info!("📊 Trajectory saved to: {}", path.display());
        }
    }

    if execution.is_complete() {
        info!("✅ Query handled in {} ms", execution.duration_ms);
    } else {
        info!("⚠️  Query handled partially in {} ms", execution.duration_ms);
    }

    Ok(())
}
