//! # Error Types Module
//!
//! Defines the error type shared by every part of the build pipeline.
//!
//! ## Categories:
//! - `Io` / `Image` / `Json`: conversions from the underlying libraries
//! - `InvalidConfig` / `MissingInput` / `MissingTool`: fatal startup errors,
//!   raised before any task is scheduled
//! - `ToolSpawn`: an external tool could not be started at all
//! - `Interrupted`: the operator cancelled the run
//!
//! Per-file failures (encoder exit codes, copy errors, ...) are *not*
//! represented here: workers log them to the run's error log and report a
//! status instead, so they never abort sibling tasks.
//!
//! ## Example:
//! ```rust
//! use asset_baker::BuildError;
//!
//! fn check_level(level: u8) -> Result<(), BuildError> {
//!     if !(1..=22).contains(&level) {
//!         return Err(BuildError::InvalidConfig("Deflate level must be between 1 and 22".into()));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

/// Errors raised by the asset build pipeline
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Project directory must be a directory: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Tool not found: {0}")]
    MissingTool(String),

    #[error("Failed to run {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build interrupted by user")]
    Interrupted,
}

impl BuildError {
    /// Process exit code for an error that ends the run (130 mirrors a shell's SIGINT status)
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Interrupted => 130,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_non_zero() {
        assert_ne!(BuildError::Interrupted.exit_code(), 0);
        assert_ne!(BuildError::InvalidConfig("bad".into()).exit_code(), 0);
    }

    #[test]
    fn test_missing_input_message() {
        let err = BuildError::MissingInput(PathBuf::from("game"));
        assert_eq!(err.to_string(), "Project directory must be a directory: game");
    }
}
