//! # Transcode Worker
//!
//! Drives the external encoder for a single texture, then optionally
//! supercompresses the produced container. Runs on the blocking pool.
//!
//! A texture whose container format the encoder cannot read is first written
//! as a PNG intermediate next to the source; the intermediate is removed
//! whatever the outcome.
//!
//! Only the non-terminal statuses (`compressing`, `deflate_failed`) are
//! reported from here; the scheduler reports the returned terminal status.

use crate::classifier::{select_format, TextureCandidate};
use crate::encoder::{EncodeRequest, ToolOutput};
use crate::error::BuildError;
use crate::file_manager::FileManager;
use crate::pipeline::{AssetTask, BuildContext, TaskStatus};
use image::ImageFormat;
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::debug;

/// Worker transcoding one texture into a KTX2 container
pub struct TranscodeWorker<'a> {
    ctx: &'a BuildContext,
}

impl<'a> TranscodeWorker<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    /// Transcode `texture` to the task's texture destination
    pub fn run(&self, task: &AssetTask, texture: TextureCandidate) -> TaskStatus {
        let started = Instant::now();
        let aggregator = &self.ctx.aggregator;
        aggregator.report(&task.name, TaskStatus::Compressing);

        let intermediate = if texture.needs_intermediate() {
            match write_intermediate(&task.source, &texture) {
                Ok(file) => Some(file),
                Err(e) => {
                    aggregator.log_error(&format!(
                        "Exception while processing {}: {}\n       Path checked: {}",
                        task.name,
                        e,
                        task.source.display()
                    ));
                    return TaskStatus::Failed;
                }
            }
        } else {
            None
        };
        let input = intermediate
            .as_ref()
            .map(|file| file.path())
            .unwrap_or(&task.source);

        let output = &task.texture_destination;
        if let Err(e) = FileManager::ensure_parent_dirs(output) {
            aggregator.log_error(&format!(
                "Failed to create output directory for {}: {}",
                task.name, e
            ));
            return TaskStatus::Failed;
        }

        let config = &self.ctx.config;
        let format = select_format(config.target, texture.is_normal_map, texture.channels);
        let request = EncodeRequest {
            input,
            output,
            format: config.transcode.then_some(format),
            quality: config.quality,
            generate_mips: config.generate_mips,
            threads: self.ctx.encoder_threads,
        };

        // a container left by an earlier run must not pass for this run's output
        discard_output(output);
        let result = self.ctx.encoder.encode(&request);
        drop(intermediate);

        match result {
            Err(e) => {
                aggregator.log_error(&format!("Failed to compress {}:\n  Error: {}", task.name, e));
                discard_output(output);
                return TaskStatus::Failed;
            }
            Ok(run) if !run.success() => {
                aggregator.log_error(&tool_failure("Failed to compress", &task.name, &run));
                discard_output(output);
                return TaskStatus::Failed;
            }
            Ok(_) if !output.exists() => {
                aggregator.log_error(&format!(
                    "Output file {} was not created for {}",
                    output.display(),
                    task.name
                ));
                return TaskStatus::Failed;
            }
            Ok(_) => {}
        }

        if config.supercompress {
            self.supercompress(task, output);
        }

        debug!(
            "Compressed {} ({}) in {:.2}s",
            task.name,
            format,
            started.elapsed().as_secs_f64()
        );
        TaskStatus::Completed
    }

    /// A failed supercompression keeps the uncompressed container
    fn supercompress(&self, task: &AssetTask, container: &Path) {
        let aggregator = &self.ctx.aggregator;
        let message = match self.ctx.encoder.supercompress(container, self.ctx.config.deflate_level) {
            Ok(run) if run.success() => return,
            Ok(run) => tool_failure("Failed to deflate", &task.name, &run),
            Err(e) => format!("Failed to deflate {}:\n  Error: {}", task.name, e),
        };

        aggregator.log_error(&message);
        aggregator.report(&task.name, TaskStatus::DeflateFailed);
    }
}

fn write_intermediate(source: &Path, texture: &TextureCandidate) -> Result<NamedTempFile, BuildError> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = source.parent().unwrap_or_else(|| Path::new("."));

    let file = tempfile::Builder::new()
        .prefix(&format!("{}.", stem))
        .suffix(".tmp.png")
        .tempfile_in(parent)?;
    texture.image.save_with_format(file.path(), ImageFormat::Png)?;
    Ok(file)
}

fn tool_failure(what: &str, name: &str, run: &ToolOutput) -> String {
    format!(
        "{} {}:\n  Command: {}\n  Return code: {}\n  STDOUT: {}\n  STDERR: {}",
        what,
        name,
        run.command,
        run.exit_code_display(),
        run.stdout.trim_end(),
        run.stderr.trim_end()
    )
}

/// Remove whatever the encoder left at `output`
fn discard_output(output: &Path) {
    if let Err(e) = std::fs::remove_file(output) {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("Could not remove {}: {}", output.display(), e);
        }
    }
}
