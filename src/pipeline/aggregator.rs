//! # Progress & Error Aggregator
//!
//! The only state shared between workers. Every mutation goes through one
//! mutex: status transitions update the counters and the in-flight list,
//! redraw the live display and append to the run's error log, so no two
//! workers can interleave a log entry or lose a counter update.
//!
//! ## Status transitions
//! ```text
//! compressing -> completed | failed        (deflate_failed may be reported in between)
//! copying     -> copied | copy_failed
//! skipped
//! ```
//!
//! ## Error log
//! One append-only file per run, `Logs/build_errors_<YYYYMMDD_HHMMSS>.log`,
//! created on the first entry. Entries look like
//! `[2026-10-18 14:03:11] Failed to compress wall.png: ...`.

use crate::progress::ProgressDisplay;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Message recorded when the operator interrupts the build
pub const INTERRUPTED_MESSAGE: &str = "Build interrupted by user (Ctrl+C)";

/// Per-file status reported by the workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Compressing,
    Copying,
    Completed,
    Skipped,
    Failed,
    DeflateFailed,
    Copied,
    CopyFailed,
}

impl TaskStatus {
    /// Whether the status ends the file's processing
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed
                | TaskStatus::Skipped
                | TaskStatus::Failed
                | TaskStatus::Copied
                | TaskStatus::CopyFailed
        )
    }

    /// Whether the status counts towards the processed files
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Skipped | TaskStatus::Copied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Compressing => "compressing",
            TaskStatus::Copying => "copying",
            TaskStatus::Completed => "completed",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Failed => "failed",
            TaskStatus::DeflateFailed => "deflate_failed",
            TaskStatus::Copied => "copied",
            TaskStatus::CopyFailed => "copy_failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Copy of the aggregated counters at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    pub processed: usize,
    pub errors: usize,
    pub active: Vec<String>,
}

#[derive(Debug)]
struct ProgressState {
    total: usize,
    completed: usize,
    processed: usize,
    errors: usize,
    active: Vec<String>,
}

/// File name of the error log for a run started at `started`
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("build_errors_{}.log", started.format("%Y%m%d_%H%M%S"))
}

fn format_entry(at: DateTime<Local>, message: &str) -> String {
    format!("[{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), message.trim_end())
}

/// Thread-safe progress counters, live display and error log
pub struct ProgressAggregator {
    state: Mutex<ProgressState>,
    log_path: PathBuf,
    display: ProgressDisplay,
}

impl ProgressAggregator {
    pub fn new(total: usize, log_path: PathBuf, display: ProgressDisplay) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                total,
                completed: 0,
                processed: 0,
                errors: 0,
                active: Vec::new(),
            }),
            log_path,
            display,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // A worker that panicked while holding the lock leaves the counters consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn display(&self) -> &ProgressDisplay {
        &self.display
    }

    /// Record a status transition for `name` and redraw
    pub fn report(&self, name: &str, status: TaskStatus) {
        let mut state = self.lock();

        match status {
            TaskStatus::Compressing | TaskStatus::Copying => {
                if !state.active.iter().any(|n| n == name) {
                    state.active.push(name.to_string());
                }
            }
            TaskStatus::DeflateFailed => {}
            _ => {
                state.completed += 1;
                if status.is_success() {
                    state.processed += 1;
                }
                state.active.retain(|n| n != name);
                debug_assert!(state.completed <= state.total);
            }
        }

        self.display.redraw(state.completed, &state.active);
    }

    /// Append a timestamped entry to the error log and count it
    pub fn log_error(&self, message: &str) {
        let mut state = self.lock();
        state.errors += 1;
        self.append(&format_entry(Local::now(), message));
    }

    /// Append the interruption entry; it does not count as an error
    pub fn log_interrupted(&self) {
        let _state = self.lock();
        self.append(&format_entry(Local::now(), INTERRUPTED_MESSAGE));
    }

    /// Caller must hold the state lock
    fn append(&self, entry: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|mut file| file.write_all(entry.as_bytes()));

        if let Err(e) = result {
            warn!("Failed to write error log {}: {}", self.log_path.display(), e);
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.lock();
        ProgressSnapshot {
            total: state.total,
            completed: state.completed,
            processed: state.processed,
            errors: state.errors,
            active: state.active.clone(),
        }
    }
}
