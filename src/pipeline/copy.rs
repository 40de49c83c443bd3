//! # Copy Worker
//!
//! Copies one non-texture asset to its destination, creating parent
//! directories as needed.

use crate::file_manager::FileManager;
use crate::pipeline::{AssetTask, BuildContext, TaskStatus};
use tracing::debug;

/// Copy the task's source to its copy destination
pub fn copy_asset(ctx: &BuildContext, task: &AssetTask) -> TaskStatus {
    ctx.aggregator.report(&task.name, TaskStatus::Copying);

    match FileManager::copy_file(&task.source, &task.copy_destination) {
        Ok(bytes) => {
            debug!("Copied {} ({} bytes)", task.name, bytes);
            TaskStatus::Copied
        }
        Err(e) => {
            ctx.aggregator
                .log_error(&format!("Failed to copy {}: {}", task.name, e));
            TaskStatus::CopyFailed
        }
    }
}
