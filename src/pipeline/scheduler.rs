//! # Build Scheduler
//!
//! Orchestrates one build run:
//! 1. discovers every file under the search roots and turns it into an `AssetTask`
//! 2. submits all tasks up front; a semaphore with `jobs` permits bounds how
//!    many run at once on the blocking pool
//! 3. collects results as they finish and reports each file's terminal
//!    status exactly once, so `completed == total` when the run ends
//! 4. stops waiting as soon as the stop signal fires
//!
//! ## Per-file dispatch
//! ```text
//! header names no image format ───────────────────┐
//! texture destination up to date ─> skipped        │
//! decodes as an image ─> transcode worker          │
//! otherwise ───────────────────────────────────────┴─> copy destination up to date ─> skipped
//!                                                      otherwise ─> copy worker
//! ```
//!
//! The `.ktx2` destination is only consulted for files whose header names an
//! image format, so a data file sharing a texture's stem is still copied.
//!
//! A worker that panics is turned into a `failed` status with a log entry;
//! it never takes sibling tasks down with it.

use crate::classifier::{self, Classification};
use crate::config::BuildConfig;
use crate::encoder::{encoder_thread_hint, Encoder};
use crate::error::BuildError;
use crate::file_manager::FileManager;
use crate::pipeline::aggregator::log_file_name;
use crate::pipeline::copy::copy_asset;
use crate::pipeline::incremental::{self, Freshness};
use crate::pipeline::transcode::TranscodeWorker;
use crate::pipeline::{AssetTask, BuildContext, ProgressAggregator, TaskStatus};
use crate::progress::ProgressDisplay;
use crate::report::BuildReport;
use chrono::Local;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, info};

/// Runs the build for one project
pub struct Scheduler {
    config: Arc<BuildConfig>,
    encoder: Arc<dyn Encoder>,
    log_path: PathBuf,
    encoder_threads: usize,
}

impl Scheduler {
    /// The error log path is fixed here, from the run's start time
    pub fn new(config: BuildConfig, encoder: Arc<dyn Encoder>) -> Self {
        let log_path = config.log_dir().join(log_file_name(Local::now()));
        Self {
            config: Arc::new(config),
            encoder,
            log_path,
            encoder_threads: encoder_thread_hint(),
        }
    }

    /// Override the thread hint passed to the encoder
    pub fn with_encoder_threads(mut self, threads: usize) -> Self {
        self.encoder_threads = threads.max(1);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Every file under the search roots, in a stable order
    pub fn discover(&self) -> Vec<AssetTask> {
        let source_root = &self.config.source_root;
        let destination_root = self.config.destination_root();

        let mut files = FileManager::find_asset_files(source_root);
        files.sort();
        debug!("Discovered {} files under {}", files.len(), source_root.display());

        files
            .into_iter()
            .map(|source| AssetTask::new(source, source_root, &destination_root))
            .collect()
    }

    /// Process `tasks` until all are done or `stop` fires
    pub async fn run(
        &self,
        tasks: Vec<AssetTask>,
        mut stop: broadcast::Receiver<()>,
    ) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let total = tasks.len();

        std::fs::create_dir_all(self.config.log_dir())?;
        let display = ProgressDisplay::new(total as u64, self.config.ci);
        let aggregator = Arc::new(ProgressAggregator::new(total, self.log_path.clone(), display));
        let ctx = BuildContext::new(
            Arc::clone(&self.config),
            Arc::clone(&self.encoder),
            Arc::clone(&aggregator),
            self.encoder_threads,
        );

        let semaphore = Arc::new(Semaphore::new(self.config.jobs));
        let mut pending = FuturesUnordered::new();
        let mut abort_handles = Vec::with_capacity(total);

        for task in tasks {
            let name = task.name.clone();
            let ctx = ctx.clone();
            let semaphore = Arc::clone(&semaphore);

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || process_task(&ctx, &task)).await
            });
            abort_handles.push(handle.abort_handle());
            pending.push(async move { (name, handle.await) });
        }

        let mut outcomes = BTreeMap::new();
        let mut listening = true;

        loop {
            tokio::select! {
                biased;

                signal = stop.recv(), if listening => match signal {
                    Err(broadcast::error::RecvError::Closed) => listening = false,
                    _ => {
                        for handle in &abort_handles {
                            handle.abort();
                        }
                        aggregator.log_interrupted();
                        aggregator.display().finish();
                        info!("Build interrupted after {} of {} files", outcomes.len(), total);
                        return Err(BuildError::Interrupted);
                    }
                },

                next = pending.next() => match next {
                    Some((name, joined)) => {
                        let status = match joined {
                            Ok(Ok(status)) => status,
                            Ok(Err(e)) | Err(e) => {
                                aggregator.log_error(&format!("Unhandled exception processing {}: {}", name, e));
                                aggregator.display().notice(&format!(
                                    "{} Unhandled exception processing {}",
                                    aggregator.display().glyphs().warn,
                                    name
                                ));
                                TaskStatus::Failed
                            }
                        };
                        aggregator.report(&name, status);
                        outcomes.insert(name, status);
                    }
                    None => break,
                },
            }
        }

        aggregator.display().finish();
        let snapshot = aggregator.snapshot();
        debug!(
            "Run finished: {}/{} completed, {} errors",
            snapshot.completed, snapshot.total, snapshot.errors
        );

        Ok(BuildReport {
            total_files: total,
            processed: snapshot.processed,
            errors: snapshot.errors,
            duration_seconds: started.elapsed().as_secs_f64(),
            log_file: aggregator.log_path().exists().then(|| aggregator.log_path().to_path_buf()),
            files: outcomes,
        })
    }
}

/// Decide what to do with one file and run the matching worker.
///
/// Blocking; returns the file's terminal status.
pub fn process_task(ctx: &BuildContext, task: &AssetTask) -> TaskStatus {
    let force = ctx.config.force_rebuild;

    if classifier::guess_format(&task.source).is_some() {
        if incremental::check(&task.source, &task.texture_destination, force) == Freshness::UpToDate {
            debug!("Up to date: {}", task.name);
            return TaskStatus::Skipped;
        }

        if let Classification::Texture(texture) = classifier::classify(&task.source, &ctx.normal_identifiers) {
            return TranscodeWorker::new(ctx).run(task, texture);
        }
    }

    if incremental::check(&task.source, &task.copy_destination, force) == Freshness::UpToDate {
        debug!("Up to date: {}", task.name);
        return TaskStatus::Skipped;
    }

    copy_asset(ctx, task)
}
