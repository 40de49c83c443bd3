//! # Incrementality Check
//!
//! Decides whether a destination is stale. A destination whose modification
//! time is at least the source's counts as up to date; ties are treated as
//! up to date at whatever precision the filesystem reports.

use crate::file_manager::FileManager;
use std::path::Path;

/// Outcome of the up-to-date check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Rebuild,
    UpToDate,
}

/// Compare source and destination modification times
pub fn check(source: &Path, destination: &Path, force_rebuild: bool) -> Freshness {
    if force_rebuild {
        return Freshness::Rebuild;
    }

    let (source_mtime, destination_mtime) = match (
        FileManager::modified_time(source),
        FileManager::modified_time(destination),
    ) {
        (Ok(source), Ok(destination)) => (source, destination),
        _ => return Freshness::Rebuild,
    };

    if destination_mtime >= source_mtime {
        Freshness::UpToDate
    } else {
        Freshness::Rebuild
    }
}
