//! Session log of planned queries

use crate::error::{Result, TrajectoryError};
use crate::trajectory::{EntryType, TrajectoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Collects the entries of every query an agent handles.
///
/// A recorder created with [`TrajectoryRecorder::with_file`] writes the log
/// each time a query completes.
pub struct TrajectoryRecorder {
    entries: Mutex<Vec<TrajectoryEntry>>,
    file_path: Option<PathBuf>,
}

/// What was persisted: per-query outcomes plus the raw entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub saved_at: DateTime<Utc>,
    pub queries: Vec<QueryRun>,
    pub entries: Vec<TrajectoryEntry>,
}

/// Outcome of one handled query, folded from its entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRun {
    pub query: String,
    pub completions: usize,
    pub translation_failures: usize,
    pub step_failures: usize,
    /// `None` while the query is still in progress
    pub success: Option<bool>,
    pub executed: usize,
    pub unresolved: usize,
    pub duration_ms: Option<u64>,
}

impl QueryRun {
    fn started(query: &str) -> Self {
        Self {
            query: query.to_string(),
            completions: 0,
            translation_failures: 0,
            step_failures: 0,
            success: None,
            executed: 0,
            unresolved: 0,
            duration_ms: None,
        }
    }
}

/// Fold entries into per-query runs. Entries before the first query start
/// (e.g. a bare executor run) are not attributed to any query.
pub fn summarize(entries: &[TrajectoryEntry]) -> Vec<QueryRun> {
    let mut runs: Vec<QueryRun> = Vec::new();

    for entry in entries {
        if let EntryType::QueryStart { query, .. } = &entry.entry_type {
            runs.push(QueryRun::started(query));
            continue;
        }
        let Some(run) = runs.last_mut() else {
            continue;
        };

        match &entry.entry_type {
            EntryType::CompletionResponse { .. } => run.completions += 1,
            EntryType::TranslationFailed { .. } => run.translation_failures += 1,
            EntryType::StepFailed { .. } => run.step_failures += 1,
            EntryType::QueryComplete {
                success,
                executed,
                unresolved,
                duration_ms,
            } => {
                run.success = Some(*success);
                run.executed = *executed;
                run.unresolved = *unresolved;
                run.duration_ms = Some(*duration_ms);
            }
            _ => {}
        }
    }

    runs
}

impl TrajectoryRecorder {
    /// Keep entries in memory only
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            file_path: None,
        }
    }

    /// Keep entries and write them to `path` whenever a query completes
    pub fn with_file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            file_path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub async fn record(&self, entry: TrajectoryEntry) -> Result<()> {
        let completes_query = matches!(entry.entry_type, EntryType::QueryComplete { .. });
        self.entries.lock().await.push(entry);

        if completes_query {
            self.save().await?;
        }
        Ok(())
    }

    pub async fn entries(&self) -> Vec<TrajectoryEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Per-query outcomes recorded so far
    pub async fn queries(&self) -> Vec<QueryRun> {
        summarize(&self.entries.lock().await)
    }

    /// Write the session log; a no-op for in-memory recorders
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let entries = self.entries().await;
        let log = SessionLog {
            saved_at: Utc::now(),
            queries: summarize(&entries),
            entries,
        };
        let json = serde_json::to_string_pretty(&log).map_err(|e| {
            TrajectoryError::RecordingFailed {
                message: e.to_string(),
            }
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, json).await?;
        tracing::debug!("Saved session log to {}", path.display());
        Ok(())
    }

    /// Read back a log written by [`Self::save`]
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<SessionLog> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|_| TrajectoryError::LoadFailed {
                path: path.display().to_string(),
            })?;
        serde_json::from_str(&content).map_err(|_| TrajectoryError::InvalidFormat.into())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

impl Default for TrajectoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}
