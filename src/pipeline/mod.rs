//! # Pipeline Module
//!
//! The incremental asset build, split by responsibility:
//! - `scheduler`: discovery, per-file dispatch and the bounded worker pool
//! - `transcode`: worker driving the external encoder for one texture
//! - `copy`: worker copying one non-texture asset
//! - `aggregator`: shared progress counters, live display and error log
//! - `incremental`: up-to-date check
//! - `path_resolver`: `AssetTask` and destination path computation

pub mod aggregator;
pub mod copy;
pub mod incremental;
pub mod path_resolver;
pub mod scheduler;
pub mod transcode;

pub use aggregator::{ProgressAggregator, TaskStatus};
pub use path_resolver::{AssetTask, PathResolver};
pub use scheduler::Scheduler;

use crate::config::BuildConfig;
use crate::encoder::Encoder;
use std::sync::Arc;

/// Everything a worker needs, shared read-only across the pool
#[derive(Clone)]
pub struct BuildContext {
    pub config: Arc<BuildConfig>,
    pub encoder: Arc<dyn Encoder>,
    pub aggregator: Arc<ProgressAggregator>,
    /// Normal-map identifiers with the default applied
    pub normal_identifiers: Arc<Vec<String>>,
    /// Thread-count hint passed to the encoder
    pub encoder_threads: usize,
}

impl BuildContext {
    pub fn new(
        config: Arc<BuildConfig>,
        encoder: Arc<dyn Encoder>,
        aggregator: Arc<ProgressAggregator>,
        encoder_threads: usize,
    ) -> Self {
        let normal_identifiers = Arc::new(config.effective_normal_identifiers());
        Self {
            config,
            encoder,
            aggregator,
            normal_identifiers,
            encoder_threads,
        }
    }
}
