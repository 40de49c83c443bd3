//! # Build Report Module
//!
//! Final outcome of a build run: the human-readable summary printed when
//! the live display is torn down, and the structured messages emitted on
//! stdout with `--json` for tooling that drives the build.
//!
//! ## JSON messages
//! One object per line, tagged by `type`:
//! - `start`: roots, file count and parallelism, before any work is done
//! - `complete`: the full `BuildReport`
//! - `interrupted`: the log file path, when the operator cancels the run

use crate::config::Target;
use crate::pipeline::TaskStatus;
use crate::progress::Glyphs;
use crate::utils::format_elapsed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub total_files: usize,
    /// Files that were completed, copied or skipped
    pub processed: usize,
    pub errors: usize,
    pub duration_seconds: f64,
    /// Present only when at least one entry was written
    pub log_file: Option<PathBuf>,
    /// Terminal status per file, keyed by display name
    pub files: BTreeMap<String, TaskStatus>,
}

impl BuildReport {
    /// Number of files that ended with `status`
    pub fn count(&self, status: TaskStatus) -> usize {
        self.files.values().filter(|s| **s == status).count()
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds.max(0.0))
    }

    /// Lines printed once the live display is removed
    pub fn summary_lines(&self, glyphs: &Glyphs) -> Vec<String> {
        let mut lines = vec![format!(
            "{} Completed: {}/{} files processed",
            glyphs.check, self.processed, self.total_files
        )];

        if self.errors > 0 {
            let log = self
                .log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            lines.push(format!(
                "{} {} error(s) occurred. Check log file: {}",
                glyphs.warn, self.errors, log
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Processed {} files in {}",
            self.processed,
            format_elapsed(self.elapsed())
        ));
        lines
    }
}

/// Structured message for `--json` consumers
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        source_root: PathBuf,
        destination_root: PathBuf,
        total_files: usize,
        jobs: usize,
        target: Target,
    },
    Complete(BuildReport),
    Interrupted {
        log_file: PathBuf,
    },
}

impl JsonMessage {
    /// Emit the message as one line on stdout
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!("Failed to serialise JSON message: {}", e),
        }
    }
}
