//! # Asset Baker Library
//!
//! Incremental asset build pipeline for a game-engine project tree: textures
//! are transcoded into GPU block formats inside KTX2 containers by an
//! external encoder, everything else is copied, and only stale outputs are
//! rebuilt.
//!
//! ## Module layout:
//! - `config`: `BuildConfig`, targets and validation
//! - `error`: `BuildError`
//! - `file_manager`: discovery under the search roots and file operations
//! - `tool_resolver`: locating the encoder and supercompression tools
//! - `encoder`: the `Encoder` seam and its command-line implementation
//! - `classifier`: texture detection and block-format selection
//! - `progress`: live display
//! - `pipeline`: scheduler, workers, aggregator, incrementality, path mapping
//! - `report`: final summary and JSON messages
//! - `interrupt`: Ctrl+C to stop signal
//!
//! ## Usage:
//! ```rust,no_run
//! use asset_baker::{BuildConfig, CliEncoder, InterruptController, Scheduler, ToolPathResolver};
//! use std::sync::Arc;
//!
//! # async fn build() -> Result<(), asset_baker::BuildError> {
//! let config = BuildConfig::for_project("MyGame");
//! config.validate()?;
//! let encoder = CliEncoder::resolve(&ToolPathResolver::new(), None, None)?;
//!
//! let interrupt = InterruptController::new();
//! let stop = interrupt.subscribe();
//! interrupt.install();
//!
//! let scheduler = Scheduler::new(config, Arc::new(encoder));
//! let tasks = scheduler.discover();
//! let report = scheduler.run(tasks, stop).await?;
//! println!("{} / {} files processed", report.processed, report.total_files);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod file_manager;
pub mod interrupt;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod tool_resolver;
pub mod utils;

pub use config::{BuildConfig, Configuration, Target};
pub use encoder::{CliEncoder, Encoder};
pub use error::BuildError;
pub use interrupt::InterruptController;
pub use pipeline::{Scheduler, TaskStatus};
pub use report::BuildReport;
pub use tool_resolver::ToolPathResolver;
