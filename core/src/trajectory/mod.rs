//! Planning trajectory recording

pub mod entry;
pub mod recorder;

pub use entry::{EntryType, Stage, TrajectoryEntry};
pub use recorder::{summarize, QueryRun, SessionLog, TrajectoryRecorder};
